// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The health-condition catalog: the universe of condition identifiers the
// rule engine may reference. Static reference data; the engine is
// re-buildable against a changed catalog without code changes elsewhere.

use clinsafe_core::types::{ConditionCategory, HealthCondition, Severity};

use ConditionCategory::{Allergy, Lab, Lifestyle, Medical, Medication};
use Severity::{Absolute, Caution};

/// Every condition id the intake questionnaire (and the demographic mapping)
/// can produce.
pub const HEALTH_CONDITIONS: &[HealthCondition] = &[
    // -- Medical history --
    HealthCondition { id: "pregnancy", label: "Pregnant or possibly pregnant", category: Medical, severity: Absolute },
    HealthCondition { id: "breastfeeding", label: "Currently breastfeeding", category: Medical, severity: Absolute },
    HealthCondition { id: "neuromuscular_disorder", label: "Neuromuscular disorder (e.g. myasthenia gravis, ALS)", category: Medical, severity: Absolute },
    HealthCondition { id: "active_skin_infection", label: "Active skin infection in the treatment area", category: Medical, severity: Absolute },
    HealthCondition { id: "keloid_scarring", label: "History of keloid or hypertrophic scarring", category: Medical, severity: Absolute },
    HealthCondition { id: "pacemaker", label: "Implanted pacemaker or defibrillator", category: Medical, severity: Absolute },
    HealthCondition { id: "bleeding_disorder", label: "Bleeding or clotting disorder", category: Medical, severity: Absolute },
    HealthCondition { id: "kidney_disease", label: "Chronic kidney disease", category: Medical, severity: Absolute },
    HealthCondition { id: "autoimmune_disease", label: "Autoimmune disease", category: Medical, severity: Caution },
    HealthCondition { id: "diabetes_uncontrolled", label: "Uncontrolled diabetes", category: Medical, severity: Caution },
    HealthCondition { id: "metal_implants", label: "Metal implants in the treatment area", category: Medical, severity: Caution },
    HealthCondition { id: "history_cold_sores", label: "History of cold sores (HSV)", category: Medical, severity: Caution },
    HealthCondition { id: "fitzpatrick_v_vi", label: "Fitzpatrick skin type V-VI", category: Medical, severity: Caution },
    HealthCondition { id: "fitzpatrick_i_ii", label: "Fitzpatrick skin type I-II (high photosensitivity)", category: Medical, severity: Caution },
    // -- Medications --
    HealthCondition { id: "blood_thinners", label: "Taking blood thinners (anticoagulants)", category: Medication, severity: Caution },
    HealthCondition { id: "accutane_use", label: "Isotretinoin (Accutane) use within 6 months", category: Medication, severity: Absolute },
    HealthCondition { id: "immunosuppressed", label: "On immunosuppressive therapy", category: Medication, severity: Caution },
    HealthCondition { id: "antibiotics_current", label: "Currently taking antibiotics", category: Medication, severity: Caution },
    // -- Allergies --
    HealthCondition { id: "lidocaine_allergy", label: "Allergy to lidocaine or other local anesthetics", category: Allergy, severity: Absolute },
    HealthCondition { id: "aspirin_allergy", label: "Allergy to aspirin or NSAIDs", category: Allergy, severity: Caution },
    // -- Lifestyle --
    HealthCondition { id: "recent_tan", label: "Recent sun tan (last 2 weeks)", category: Lifestyle, severity: Caution },
    HealthCondition { id: "smoking", label: "Current smoker", category: Lifestyle, severity: Caution },
    HealthCondition { id: "recent_filler", label: "Dermal filler in the last 4 weeks", category: Lifestyle, severity: Caution },
    // -- Lab work --
    HealthCondition { id: "abnormal_labs", label: "Abnormal recent lab results", category: Lab, severity: Absolute },
    HealthCondition { id: "no_recent_labs", label: "No lab work in the last 6 months", category: Lab, severity: Caution },
];

/// Look up the display label for a condition id.
///
/// An id the catalog does not know still blocks or cautions; it acts as its
/// own label rather than being silently dropped.
pub fn condition_label(id: &str) -> String {
    HEALTH_CONDITIONS
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.label.to_owned())
        .unwrap_or_else(|| id.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_id_resolves_to_label() {
        assert_eq!(condition_label("pregnancy"), "Pregnant or possibly pregnant");
        assert_eq!(condition_label("recent_tan"), "Recent sun tan (last 2 weeks)");
    }

    #[test]
    fn unknown_id_is_its_own_label() {
        assert_eq!(condition_label("mystery_condition"), "mystery_condition");
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<&str> = HEALTH_CONDITIONS.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), HEALTH_CONDITIONS.len());
    }
}
