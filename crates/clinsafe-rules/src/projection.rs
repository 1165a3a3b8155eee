// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Safety status projection: run the engine across a patient's full
// recommendation set and attach the verdicts for display and consent
// gating. Pure mapping, no new decision logic. Must be re-run whenever the
// condition set, lab flag, or demographic inputs change; existing statuses
// are overwritten unconditionally so a stale verdict can never survive.

use tracing::debug;

use clinsafe_core::types::TreatmentPlan;

use crate::engine::check_treatment_safety;

/// Counts for consent-flow gating after a projection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSafetySummary {
    pub blocked: usize,
    pub cautioned: usize,
    pub conditional: usize,
}

/// Annotate every item in the plan with a freshly computed safety status.
pub fn annotate_plan(
    plan: &mut TreatmentPlan,
    conditions: &[String],
    has_lab_work: bool,
) -> PlanSafetySummary {
    let mut summary = PlanSafetySummary::default();

    let mut apply = |name: &str| {
        let status = check_treatment_safety(name, conditions, has_lab_work).into_status();
        if status.is_blocked {
            summary.blocked += 1;
        }
        if status.has_cautions {
            summary.cautioned += 1;
        }
        if status.is_conditional {
            summary.conditional += 1;
        }
        status
    };

    for item in &mut plan.procedures {
        item.safety = Some(apply(&item.name));
    }
    for item in &mut plan.peptides {
        item.safety = Some(apply(&item.name));
    }
    for item in &mut plan.iv_protocols {
        item.safety = Some(apply(&item.name));
    }

    debug!(
        blocked = summary.blocked,
        cautioned = summary.cautioned,
        conditional = summary.conditional,
        "treatment plan annotated"
    );
    summary
}
