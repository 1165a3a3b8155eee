// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! clinsafe-rules: Deterministic clinical contraindication engine.
//!
//! A fixed, enumerable rule table per treatment (not a rules DSL), evaluated
//! as a pure function of the patient's declared condition set, lab-work
//! availability, and demographic-derived condition ids. A wrong "cleared"
//! verdict has real clinical consequence, so every decision is explainable:
//! verdicts carry the human-readable labels that produced them.

pub mod catalog;
pub mod engine;
pub mod projection;
pub mod tables;

pub use catalog::condition_label;
pub use engine::{
    check_treatment_interaction, check_treatment_safety, explain_blocked, merge_demographics,
    post_care_recommendations, InteractionCheck, SafetyCheckResult,
};
pub use projection::{annotate_plan, PlanSafetySummary};
