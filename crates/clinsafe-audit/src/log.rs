// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The audit ledger: an explicit instance holding its own entry cache and
// initialized flag (no process-wide globals). Entries are redacted at
// construction, appended in call order, and persisted immediately through
// the secure object store.
//
// Persistence failures are logged and swallowed: a ledger write must never
// block the user-facing operation that triggered it. They still surface on
// the diagnostic channel for operational alerting.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use clinsafe_core::error::{ClinsafeError, Result};
use clinsafe_core::types::{AuditEventType, AuditLogEntry, AuditOutcome, UserRole};
use clinsafe_core::CoreConfig;
use clinsafe_crypto::{secure_id, KeyValueStore, SecureObjectStore};

use crate::redact::{redact_details, redact_identifier};

/// Key-value slot the serialized ledger lives under.
pub const AUDIT_STORAGE_KEY: &str = "clinsafe.audit_log";

/// Optional fields for one audit record.
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub user_id: Option<String>,
    pub user_role: UserRole,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub outcome: AuditOutcome,
    pub details: Option<Map<String, Value>>,
    pub phi_accessed: bool,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            user_id: None,
            user_role: UserRole::System,
            resource_type: None,
            resource_id: None,
            outcome: AuditOutcome::Success,
            details: None,
            phi_accessed: false,
        }
    }
}

/// Filter for ledger reads.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub event_types: Option<Vec<AuditEventType>>,
    pub user_role: Option<UserRole>,
    pub phi_only: bool,
    pub limit: Option<usize>,
}

/// Aggregate counters over the in-memory cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSummary {
    pub total_entries: usize,
    pub phi_access_count: usize,
    pub login_success: usize,
    pub login_failure: usize,
    pub consent_events: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Append-only, redacting audit ledger.
pub struct AuditLog<'a> {
    kv: &'a dyn KeyValueStore,
    store: &'a SecureObjectStore,
    config: CoreConfig,
    entries: Vec<AuditLogEntry>,
    initialized: bool,
}

impl<'a> AuditLog<'a> {
    pub fn new(
        kv: &'a dyn KeyValueStore,
        store: &'a SecureObjectStore,
        config: CoreConfig,
    ) -> Self {
        Self {
            kv,
            store,
            config,
            entries: Vec::new(),
            initialized: false,
        }
    }

    /// Load the persisted ledger, apply retention, and record the
    /// initialization as its own access event.
    ///
    /// Retention: entries older than the configured window are dropped, then
    /// the newest `audit_max_entries` are kept. The ledger is re-persisted
    /// only when the prune actually removed something.
    #[instrument(skip_all)]
    pub fn load(&mut self) -> Result<()> {
        let loaded: Vec<AuditLogEntry> = self
            .store
            .fetch(self.kv, AUDIT_STORAGE_KEY)?
            .unwrap_or_default();
        let loaded_count = loaded.len();
        self.entries = loaded;

        let pruned = self.apply_retention();
        if pruned > 0 {
            info!(pruned, retained = self.entries.len(), "audit retention applied");
            self.persist();
        }
        self.initialized = true;
        debug!(loaded = loaded_count, "audit ledger loaded");

        self.record(
            AuditEventType::PhiAccess,
            "audit_log_initialized",
            RecordOptions {
                phi_accessed: true,
                ..RecordOptions::default()
            },
        )?;
        Ok(())
    }

    fn apply_retention(&mut self) -> usize {
        let before = self.entries.len();
        let cutoff = Utc::now() - Duration::days(i64::from(self.config.audit_retention_days));
        self.entries.retain(|e| e.timestamp >= cutoff);

        let max = self.config.audit_max_entries;
        if self.entries.len() > max {
            let drop = self.entries.len() - max;
            self.entries.drain(..drop);
        }
        before - self.entries.len()
    }

    /// Record one event. Identifier fields and the detail map are redacted
    /// before the entry is constructed; the entry is persisted before this
    /// call returns.
    ///
    /// When auditing is disabled in the config nothing is recorded and the
    /// nil id is returned.
    #[instrument(skip(self, options), fields(event_type = ?event_type, action = %action))]
    pub fn record(
        &mut self,
        event_type: AuditEventType,
        action: &str,
        options: RecordOptions,
    ) -> Result<Uuid> {
        if !self.config.audit_enabled {
            return Ok(Uuid::nil());
        }
        let id = secure_id()?;
        let entry = AuditLogEntry {
            id,
            timestamp: Utc::now(),
            event_type,
            user_id: options.user_id.as_deref().map(redact_identifier),
            user_role: options.user_role,
            action: action.to_owned(),
            resource_type: options.resource_type,
            resource_id: options.resource_id.as_deref().map(redact_identifier),
            outcome: options.outcome,
            details: options.details.as_ref().map(redact_details),
            phi_accessed: options.phi_accessed,
        };

        self.entries.push(entry);
        self.persist();
        Ok(id)
    }

    /// Read access, newest first. Reading the ledger is itself a PHI-access
    /// event and is recorded recursively.
    pub fn query(&mut self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>> {
        let mut matched: Vec<AuditLogEntry> = self
            .entries
            .iter()
            .filter(|e| query.start.is_none_or(|start| e.timestamp >= start))
            .filter(|e| query.end.is_none_or(|end| e.timestamp <= end))
            .filter(|e| {
                query
                    .event_types
                    .as_ref()
                    .is_none_or(|types| types.contains(&e.event_type))
            })
            .filter(|e| query.user_role.is_none_or(|role| e.user_role == role))
            .filter(|e| !query.phi_only || e.phi_accessed)
            .cloned()
            .collect();
        matched.reverse();
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        let mut details = Map::new();
        details.insert("matched".into(), Value::from(matched.len()));
        self.record(
            AuditEventType::PhiAccess,
            "audit_log_query",
            RecordOptions {
                phi_accessed: true,
                details: Some(details),
                ..RecordOptions::default()
            },
        )?;

        Ok(matched)
    }

    /// Aggregate counters over the cache. Pure read, not self-logged.
    pub fn summary(&self) -> AuditSummary {
        let mut summary = AuditSummary {
            total_entries: self.entries.len(),
            phi_access_count: 0,
            login_success: 0,
            login_failure: 0,
            consent_events: 0,
            last_activity: self.entries.last().map(|e| e.timestamp),
        };
        for entry in &self.entries {
            if entry.phi_accessed {
                summary.phi_access_count += 1;
            }
            if entry.event_type == AuditEventType::Login {
                match entry.outcome {
                    AuditOutcome::Success => summary.login_success += 1,
                    AuditOutcome::Failure | AuditOutcome::Denied => summary.login_failure += 1,
                }
            }
            if matches!(
                entry.event_type,
                AuditEventType::ConsentGiven | AuditEventType::ConsentDeclined
            ) {
                summary.consent_events += 1;
            }
        }
        summary
    }

    /// Serialized dump of the date range for compliance reporting. The export
    /// itself is logged with the count and the range; the range is not PHI,
    /// so it survives redaction.
    pub fn export(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<String> {
        let exported: Vec<&AuditLogEntry> = self
            .entries
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .collect();
        let serialized = serde_json::to_string_pretty(&exported)?;

        // Second precision keeps the timestamps clear of the digit-run
        // scrub; sub-second resolution has no audit value here.
        let mut details = Map::new();
        details.insert("exported_count".into(), Value::from(exported.len()));
        details.insert(
            "range_start".into(),
            Value::from(start.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        details.insert(
            "range_end".into(),
            Value::from(end.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        self.record(
            AuditEventType::PhiExport,
            "audit_log_export",
            RecordOptions {
                phi_accessed: true,
                details: Some(details),
                ..RecordOptions::default()
            },
        )?;

        Ok(serialized)
    }

    /// Log a PHI_DELETE event recording the prior count, then irreversibly
    /// empty the ledger and remove its persisted record.
    pub fn clear(&mut self) -> Result<()> {
        let mut details = Map::new();
        details.insert("cleared_count".into(), Value::from(self.entries.len()));
        self.record(
            AuditEventType::PhiDelete,
            "audit_log_cleared",
            RecordOptions {
                details: Some(details),
                ..RecordOptions::default()
            },
        )?;

        self.entries.clear();
        self.kv.remove_item(AUDIT_STORAGE_KEY)?;
        info!("audit ledger cleared");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) {
        // With encryption switched off the ledger is written as plaintext
        // JSON; `load` reads that form back through the same pass-through
        // that handles pre-encryption records.
        let result = if self.config.encryption_enabled {
            self.store.put(self.kv, AUDIT_STORAGE_KEY, &self.entries)
        } else {
            serde_json::to_string(&self.entries)
                .map_err(ClinsafeError::from)
                .and_then(|raw| self.kv.set_item(AUDIT_STORAGE_KEY, &raw))
        };
        if let Err(e) = result {
            // Surfaced on the diagnostic channel only; the primary operation
            // that triggered this write must not fail because of the ledger.
            warn!(error = %e, "audit ledger persistence failed");
        }
    }
}
