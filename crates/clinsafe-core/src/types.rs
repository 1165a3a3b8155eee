// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Clinsafe clinical safety engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a declared health condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionCategory {
    Medical,
    Medication,
    Allergy,
    Lifestyle,
    Lab,
}

/// How severely a condition restricts a treatment when matched by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Matching this condition blocks the treatment outright.
    Absolute,
    /// Matching this condition annotates the treatment with a caution.
    Caution,
}

/// One entry in the static health-condition catalog.
///
/// The catalog is the universe of condition identifiers the rule engine may
/// reference. Immutable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCondition {
    pub id: &'static str,
    pub label: &'static str,
    pub category: ConditionCategory,
    pub severity: Severity,
}

/// Safety verdict attached to a treatment plan item.
///
/// Serializable twin of the engine's computed result. Derived fresh on every
/// evaluation; patient condition state can change between consultations, so
/// a stale status must never be displayed as current.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyStatus {
    pub is_blocked: bool,
    pub blocked_reasons: Vec<String>,
    pub has_cautions: bool,
    pub caution_reasons: Vec<String>,
    pub requires_lab_work: bool,
    pub required_lab_tests: Vec<String>,
    pub is_conditional: bool,
    pub conditional_message: Option<String>,
}

/// An in-clinic procedure recommended for a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalProcedure {
    pub name: String,
    pub benefit: String,
    pub price: String,
    pub safety: Option<SafetyStatus>,
}

/// A peptide therapy protocol recommended for a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeptideTherapy {
    pub name: String,
    pub goal: String,
    pub frequency: String,
    pub price: String,
    pub safety: Option<SafetyStatus>,
}

/// An IV optimization protocol recommended for a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvOptimization {
    pub name: String,
    pub goal: String,
    pub price: String,
    pub safety: Option<SafetyStatus>,
}

/// A patient's full recommendation set across all three treatment groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub procedures: Vec<ClinicalProcedure>,
    pub peptides: Vec<PeptideTherapy>,
    pub iv_protocols: Vec<IvOptimization>,
}

/// Compliance-relevant events recorded in the audit ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    Login,
    Logout,
    PhiAccess,
    PhiCreate,
    PhiUpdate,
    PhiDelete,
    PhiExport,
    ConsentGiven,
    ConsentDeclined,
    PhotoCapture,
    BiometricScan,
    CrmSync,
    /// Decrypt-time tag mismatch or other tamper signal.
    IntegrityAlert,
}

/// Outcome of the audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
    Denied,
}

/// Who performed the audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Patient,
    Staff,
    System,
}

/// A single entry in the audit ledger.
///
/// Append-only: once written, an entry is immutable except for the bulk
/// retention prune. Identifier fields are redacted before construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub user_role: UserRole,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub outcome: AuditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
    pub phi_accessed: bool,
}

/// Fitzpatrick skin phototype, derived from intake photos or questionnaire.
///
/// The rule engine never computes this; callers fold the mapped synthetic
/// condition id into the patient's condition set before evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitzpatrickType {
    I,
    II,
    III,
    IV,
    V,
    VI,
}

impl FitzpatrickType {
    /// Synthetic condition id this skin type contributes, if any.
    ///
    /// Types V/VI carry post-inflammatory hyperpigmentation risk for energy
    /// devices; types I/II carry elevated photosensitivity risk.
    pub fn condition_id(&self) -> Option<&'static str> {
        match self {
            Self::V | Self::VI => Some("fitzpatrick_v_vi"),
            Self::I | Self::II => Some("fitzpatrick_i_ii"),
            Self::III | Self::IV => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitzpatrick_mapping() {
        assert_eq!(FitzpatrickType::V.condition_id(), Some("fitzpatrick_v_vi"));
        assert_eq!(FitzpatrickType::VI.condition_id(), Some("fitzpatrick_v_vi"));
        assert_eq!(FitzpatrickType::I.condition_id(), Some("fitzpatrick_i_ii"));
        assert_eq!(FitzpatrickType::III.condition_id(), None);
    }

    #[test]
    fn event_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&AuditEventType::PhiExport).unwrap();
        assert_eq!(json, "\"PHI_EXPORT\"");
    }

    #[test]
    fn safety_status_default_is_all_clear() {
        let status = SafetyStatus::default();
        assert!(!status.is_blocked);
        assert!(!status.has_cautions);
        assert!(!status.is_conditional);
        assert!(status.conditional_message.is_none());
    }
}
