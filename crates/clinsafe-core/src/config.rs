// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

/// Persistent application settings for the safety and compliance core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Audit entries older than this are dropped on init (HIPAA-style window).
    pub audit_retention_days: u32,
    /// Hard cap on retained audit entries after the age prune.
    pub audit_max_entries: usize,
    /// Encrypt objects before they reach the key-value store.
    pub encryption_enabled: bool,
    /// Record compliance events to the audit ledger.
    pub audit_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            audit_retention_days: 365,
            audit_max_entries: 1000,
            encryption_enabled: true,
            audit_enabled: true,
        }
    }
}
