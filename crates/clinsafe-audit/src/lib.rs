// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! clinsafe-audit: Append-only compliance ledger with PII redaction.
//!
//! Every compliance-relevant event is redacted before it is written, encrypted
//! through the secure object store, and persisted immediately, so a crash right
//! after a state-changing action does not lose the corresponding trail.

pub mod log;
pub mod redact;

pub use log::{AuditLog, AuditQuery, AuditSummary, RecordOptions};
pub use redact::{redact_details, redact_identifier};
