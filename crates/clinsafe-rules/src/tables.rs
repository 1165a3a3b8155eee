// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Static rule tables: one contraindication rule per treatment across the
// three treatment groups, plus pairwise interaction rules and follow-on
// recommendation rules. Lookup goes through precomputed maps keyed by
// lowercased treatment name, so "rule not found" is an explicit branch
// rather than a silent linear-scan miss.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Per-treatment safety rule. Treatment names match case-insensitively but
/// exactly; no substring or fuzzy matching.
pub struct ContraindicationRule {
    pub treatment: &'static str,
    pub absolute_red_flags: &'static [&'static str],
    pub caution_flags: &'static [&'static str],
    pub requires_lab_work: bool,
    pub lab_work_type: &'static [&'static str],
}

/// Same-visit or insufficient-interval conflict between two treatments.
pub struct TreatmentInteractionRule {
    pub treatment: &'static str,
    pub incompatible_with: &'static [&'static str],
    pub wait_period_days: u32,
    pub warning_message: &'static str,
}

/// "If treatment X was done, treatment Y should follow."
pub struct TreatmentRecommendationRule {
    pub trigger_treatment: &'static str,
    pub recommend_treatment: &'static str,
    pub reason: &'static str,
    pub is_post_care: bool,
}

// ---------------------------------------------------------------------------
// Contraindication rules
// ---------------------------------------------------------------------------

/// In-clinic procedures.
pub const PROCEDURE_RULES: &[ContraindicationRule] = &[
    ContraindicationRule {
        treatment: "Botox Cosmetic",
        absolute_red_flags: &["pregnancy", "breastfeeding", "neuromuscular_disorder"],
        caution_flags: &["blood_thinners", "autoimmune_disease"],
        requires_lab_work: false,
        lab_work_type: &[],
    },
    ContraindicationRule {
        treatment: "Dermal Fillers",
        absolute_red_flags: &[
            "pregnancy",
            "breastfeeding",
            "lidocaine_allergy",
            "active_skin_infection",
        ],
        caution_flags: &["blood_thinners", "history_cold_sores", "autoimmune_disease"],
        requires_lab_work: false,
        lab_work_type: &[],
    },
    ContraindicationRule {
        treatment: "Sculptra",
        absolute_red_flags: &["pregnancy", "breastfeeding", "active_skin_infection"],
        caution_flags: &["recent_filler", "immunosuppressed"],
        requires_lab_work: false,
        lab_work_type: &[],
    },
    ContraindicationRule {
        treatment: "Morpheus8",
        absolute_red_flags: &[
            "pregnancy",
            "active_skin_infection",
            "pacemaker",
            "keloid_scarring",
        ],
        caution_flags: &[
            "recent_tan",
            "fitzpatrick_v_vi",
            "metal_implants",
            "diabetes_uncontrolled",
        ],
        requires_lab_work: false,
        lab_work_type: &[],
    },
    ContraindicationRule {
        treatment: "CO2 Laser Resurfacing",
        absolute_red_flags: &[
            "pregnancy",
            "accutane_use",
            "active_skin_infection",
            "keloid_scarring",
        ],
        caution_flags: &["recent_tan", "fitzpatrick_v_vi", "history_cold_sores", "smoking"],
        requires_lab_work: false,
        lab_work_type: &[],
    },
    ContraindicationRule {
        treatment: "Chemical Peel",
        absolute_red_flags: &["accutane_use", "active_skin_infection"],
        caution_flags: &["recent_tan", "fitzpatrick_v_vi", "history_cold_sores"],
        requires_lab_work: false,
        lab_work_type: &[],
    },
    ContraindicationRule {
        treatment: "Microneedling",
        absolute_red_flags: &["active_skin_infection", "keloid_scarring"],
        caution_flags: &["blood_thinners", "diabetes_uncontrolled"],
        requires_lab_work: false,
        lab_work_type: &[],
    },
    ContraindicationRule {
        treatment: "Plasma BioFiller",
        absolute_red_flags: &["bleeding_disorder", "active_skin_infection"],
        caution_flags: &["blood_thinners", "smoking"],
        requires_lab_work: true,
        lab_work_type: &["CBC", "Platelet Count"],
    },
    ContraindicationRule {
        treatment: "PRP Hair Restoration",
        absolute_red_flags: &["bleeding_disorder"],
        caution_flags: &["blood_thinners", "smoking"],
        requires_lab_work: true,
        lab_work_type: &["CBC", "Platelet Count"],
    },
];

/// Peptide therapy protocols.
pub const PEPTIDE_RULES: &[ContraindicationRule] = &[
    ContraindicationRule {
        treatment: "BPC-157",
        absolute_red_flags: &["pregnancy", "breastfeeding"],
        caution_flags: &["immunosuppressed"],
        requires_lab_work: false,
        lab_work_type: &[],
    },
    ContraindicationRule {
        treatment: "Semaglutide",
        absolute_red_flags: &["pregnancy", "breastfeeding"],
        caution_flags: &["diabetes_uncontrolled"],
        requires_lab_work: true,
        lab_work_type: &["Comprehensive Metabolic Panel", "HbA1c"],
    },
    ContraindicationRule {
        treatment: "CJC-1295 / Ipamorelin",
        absolute_red_flags: &["pregnancy"],
        caution_flags: &["diabetes_uncontrolled"],
        requires_lab_work: true,
        lab_work_type: &["IGF-1"],
    },
];

/// IV optimization protocols.
pub const IV_RULES: &[ContraindicationRule] = &[
    ContraindicationRule {
        treatment: "NAD+ IV Therapy",
        absolute_red_flags: &["kidney_disease"],
        caution_flags: &["diabetes_uncontrolled"],
        requires_lab_work: true,
        lab_work_type: &["Comprehensive Metabolic Panel"],
    },
    ContraindicationRule {
        treatment: "Myers Cocktail IV",
        absolute_red_flags: &["kidney_disease"],
        caution_flags: &["immunosuppressed"],
        requires_lab_work: false,
        lab_work_type: &[],
    },
];

// ---------------------------------------------------------------------------
// Interaction and recommendation rules
// ---------------------------------------------------------------------------

pub const INTERACTION_RULES: &[TreatmentInteractionRule] = &[
    TreatmentInteractionRule {
        treatment: "Sculptra",
        incompatible_with: &["Dermal Fillers"],
        wait_period_days: 28,
        warning_message: "Sculptra should not be layered over dermal fillers in the same area; \
                          allow a 28-day wait so existing filler can settle before biostimulation.",
    },
    TreatmentInteractionRule {
        treatment: "CO2 Laser Resurfacing",
        incompatible_with: &["Morpheus8", "Chemical Peel"],
        wait_period_days: 90,
        warning_message: "CO2 resurfacing cannot be combined with other energy-based or \
                          exfoliating treatments; allow at least a 90-day interval between sessions.",
    },
    TreatmentInteractionRule {
        treatment: "Microneedling",
        incompatible_with: &["Chemical Peel"],
        wait_period_days: 14,
        warning_message: "Microneedling and chemical peels compromise the same skin barrier; \
                          separate them by at least 14 days.",
    },
];

pub const RECOMMENDATION_RULES: &[TreatmentRecommendationRule] = &[
    TreatmentRecommendationRule {
        trigger_treatment: "Morpheus8",
        recommend_treatment: "BPC-157",
        reason: "Supports tissue repair and collagen remodelling after radiofrequency microneedling",
        is_post_care: true,
    },
    TreatmentRecommendationRule {
        trigger_treatment: "CO2 Laser Resurfacing",
        recommend_treatment: "BPC-157",
        reason: "Accelerates re-epithelialisation after ablative resurfacing",
        is_post_care: true,
    },
    TreatmentRecommendationRule {
        trigger_treatment: "PRP Hair Restoration",
        recommend_treatment: "NAD+ IV Therapy",
        reason: "Supports cellular energy metabolism during the regrowth cycle",
        is_post_care: true,
    },
    TreatmentRecommendationRule {
        trigger_treatment: "Semaglutide",
        recommend_treatment: "Myers Cocktail IV",
        reason: "Replaces micronutrients commonly depleted while on GLP-1 therapy",
        is_post_care: false,
    },
];

// ---------------------------------------------------------------------------
// Precomputed lookup maps
// ---------------------------------------------------------------------------

static RULE_INDEX: LazyLock<HashMap<String, &'static ContraindicationRule>> =
    LazyLock::new(|| {
        PROCEDURE_RULES
            .iter()
            .chain(PEPTIDE_RULES)
            .chain(IV_RULES)
            .map(|rule| (rule.treatment.to_lowercase(), rule))
            .collect()
    });

static INTERACTION_INDEX: LazyLock<HashMap<String, Vec<&'static TreatmentInteractionRule>>> =
    LazyLock::new(|| {
        let mut index: HashMap<String, Vec<&'static TreatmentInteractionRule>> = HashMap::new();
        for rule in INTERACTION_RULES {
            index
                .entry(rule.treatment.to_lowercase())
                .or_default()
                .push(rule);
        }
        index
    });

/// The contraindication rule for a treatment, if one is defined.
pub fn rule_for(treatment: &str) -> Option<&'static ContraindicationRule> {
    RULE_INDEX.get(&treatment.to_lowercase()).copied()
}

/// All interaction rules keyed on a treatment.
pub fn interactions_for(treatment: &str) -> &'static [&'static TreatmentInteractionRule] {
    INTERACTION_INDEX
        .get(&treatment.to_lowercase())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HEALTH_CONDITIONS;

    #[test]
    fn lookup_is_case_insensitive_and_exact() {
        assert!(rule_for("botox cosmetic").is_some());
        assert!(rule_for("BOTOX COSMETIC").is_some());
        assert!(rule_for("Botox").is_none(), "no substring matching");
        assert!(rule_for("Nonexistent Treatment X").is_none());
    }

    #[test]
    fn every_rule_flag_exists_in_the_catalog() {
        let known: Vec<&str> = HEALTH_CONDITIONS.iter().map(|c| c.id).collect();
        for rule in PROCEDURE_RULES.iter().chain(PEPTIDE_RULES).chain(IV_RULES) {
            for id in rule.absolute_red_flags.iter().chain(rule.caution_flags) {
                assert!(known.contains(id), "{} references unknown id {id}", rule.treatment);
            }
        }
    }

    #[test]
    fn lab_requiring_rules_name_their_tests() {
        for rule in PROCEDURE_RULES.iter().chain(PEPTIDE_RULES).chain(IV_RULES) {
            if rule.requires_lab_work {
                assert!(
                    !rule.lab_work_type.is_empty(),
                    "{} requires lab work but names no tests",
                    rule.treatment
                );
            }
        }
    }

    #[test]
    fn interaction_lookup_finds_sculptra_rule() {
        let rules = interactions_for("sculptra");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].wait_period_days, 28);
        assert!(interactions_for("Botox Cosmetic").is_empty());
    }
}
