// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The safety decision function. Pure: (treatment name, condition set,
// lab-work flag) -> verdict. Never raises for business reasons; an unknown
// treatment or an empty condition set are normal inputs, not failures.
//
// Decision order per evaluation:
//   1. rule lookup (case-insensitive exact); no rule -> all-clear
//   2. absolute red flags -> blocked_reasons (blocking is never overridable)
//   3. caution flags -> caution_reasons (annotate, never block)
//   4. lab gate: rule requires lab work and none supplied -> conditional
//   5. the three verdict axes are independent and can co-occur

use serde::{Deserialize, Serialize};
use tracing::debug;

use clinsafe_core::types::{FitzpatrickType, SafetyStatus};

use crate::catalog::condition_label;
use crate::tables::{self, TreatmentRecommendationRule};

/// Structured safety verdict for one treatment against one patient state.
///
/// Computed fresh on every call and never cached; the patient's condition
/// set can change between consultations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyCheckResult {
    pub treatment: String,
    pub is_blocked: bool,
    pub blocked_reasons: Vec<String>,
    pub has_cautions: bool,
    pub caution_reasons: Vec<String>,
    pub requires_lab_work: bool,
    pub required_lab_tests: Vec<String>,
    pub is_conditional: bool,
    pub conditional_message: Option<String>,
}

impl SafetyCheckResult {
    fn all_clear(treatment: &str) -> Self {
        Self {
            treatment: treatment.to_owned(),
            is_blocked: false,
            blocked_reasons: Vec::new(),
            has_cautions: false,
            caution_reasons: Vec::new(),
            requires_lab_work: false,
            required_lab_tests: Vec::new(),
            is_conditional: false,
            conditional_message: None,
        }
    }

    /// Convert into the display-layer status attached to plan items.
    pub fn into_status(self) -> SafetyStatus {
        SafetyStatus {
            is_blocked: self.is_blocked,
            blocked_reasons: self.blocked_reasons,
            has_cautions: self.has_cautions,
            caution_reasons: self.caution_reasons,
            requires_lab_work: self.requires_lab_work,
            required_lab_tests: self.required_lab_tests,
            is_conditional: self.is_conditional,
            conditional_message: self.conditional_message,
        }
    }
}

/// Result of a same-visit treatment compatibility check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionCheck {
    pub has_conflict: bool,
    pub conflict_message: Option<String>,
}

/// Evaluate one treatment against the patient's declared condition set.
///
/// A treatment with no rule in the table is unconditionally safe, since no
/// restrictions are defined for it. Supplying `has_lab_work = true` always
/// clears the lab gate, whether or not the rule asks for labs.
pub fn check_treatment_safety(
    treatment: &str,
    conditions: &[String],
    has_lab_work: bool,
) -> SafetyCheckResult {
    let Some(rule) = tables::rule_for(treatment) else {
        debug!(%treatment, "no rule defined, treatment unrestricted");
        return SafetyCheckResult::all_clear(treatment);
    };

    let has = |id: &str| conditions.iter().any(|c| c == id);

    let blocked_reasons: Vec<String> = rule
        .absolute_red_flags
        .iter()
        .filter(|id| has(id))
        .map(|id| condition_label(id))
        .collect();

    let caution_reasons: Vec<String> = rule
        .caution_flags
        .iter()
        .filter(|id| has(id))
        .map(|id| condition_label(id))
        .collect();

    let is_conditional = rule.requires_lab_work && !has_lab_work;
    let conditional_message = is_conditional.then(|| {
        format!(
            "{} requires recent lab work ({}) before it can be scheduled.",
            rule.treatment,
            rule.lab_work_type.join(", "),
        )
    });

    SafetyCheckResult {
        treatment: rule.treatment.to_owned(),
        is_blocked: !blocked_reasons.is_empty(),
        blocked_reasons,
        has_cautions: !caution_reasons.is_empty(),
        caution_reasons,
        requires_lab_work: rule.requires_lab_work,
        required_lab_tests: rule.lab_work_type.iter().map(|s| (*s).to_owned()).collect(),
        is_conditional,
        conditional_message,
    }
}

/// Check the selected treatment against treatments already chosen for this
/// visit. First matching rule wins; conflicts are not aggregated.
pub fn check_treatment_interaction(
    selected: &str,
    existing_treatments: &[String],
) -> InteractionCheck {
    for rule in tables::interactions_for(selected) {
        for incompatible in rule.incompatible_with {
            let clash = existing_treatments
                .iter()
                .any(|t| t.eq_ignore_ascii_case(incompatible));
            if clash {
                return InteractionCheck {
                    has_conflict: true,
                    conflict_message: Some(rule.warning_message.to_owned()),
                };
            }
        }
    }
    InteractionCheck {
        has_conflict: false,
        conflict_message: None,
    }
}

/// Post-care follow-on rules triggered by a completed treatment.
pub fn post_care_recommendations(treatment: &str) -> Vec<&'static TreatmentRecommendationRule> {
    tables::RECOMMENDATION_RULES
        .iter()
        .filter(|r| r.trigger_treatment.eq_ignore_ascii_case(treatment) && r.is_post_care)
        .collect()
}

/// Render a blocked verdict as one natural-language sentence.
///
/// Returns the empty string when no blocked reasons exist; callers should
/// not display an explanation for a non-blocked treatment.
pub fn explain_blocked(treatment: &str, blocked_reasons: &[String]) -> String {
    if blocked_reasons.is_empty() {
        return String::new();
    }
    format!(
        "{} is contraindicated due to your reported history of {}, which increases the risk of adverse reactions.",
        treatment,
        blocked_reasons.join(", "),
    )
}

/// Fold demographic-derived synthetic condition ids into the declared set.
///
/// The engine consumes condition ids only; computing demographics (skin-type
/// detection, age derivation) stays with the caller.
pub fn merge_demographics(
    conditions: &[String],
    fitzpatrick: Option<FitzpatrickType>,
) -> Vec<String> {
    let mut merged: Vec<String> = conditions.to_vec();
    if let Some(id) = fitzpatrick.and_then(|f| f.condition_id()) {
        if !merged.iter().any(|c| c == id) {
            merged.push(id.to_owned());
        }
    }
    merged
}
