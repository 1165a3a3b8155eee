// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Clinsafe.
//
// Error messages must never carry plaintext, key bytes, or patient
// identifiers; lengths and provider names only.

use thiserror::Error;

/// Top-level error type for all Clinsafe operations.
#[derive(Debug, Error)]
pub enum ClinsafeError {
    // -- Crypto errors --
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Authentication tag mismatch: possible tampering detected.
    /// The payload must not be trusted, even partially.
    #[error("integrity check failed: possible tampering detected")]
    IntegrityFailure,

    #[error("unsupported payload version: {0}")]
    UnsupportedVersion(u8),

    // -- Storage / persistence --
    #[error("secure key storage unavailable: {0}")]
    SecureStorage(String),

    #[error("key-value store error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ClinsafeError>;
