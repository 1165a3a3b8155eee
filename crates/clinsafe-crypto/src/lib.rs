// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! clinsafe-crypto: Cryptographic foundation for PHI-at-rest protection.
//!
//! This crate provides the authenticated-encryption envelope, master-key
//! management over the platform keychain, one-way hashing for biometric
//! fingerprinting, and the secure object store adapter that every persisted
//! patient record passes through.
//!
//! HIGH-ASSURANCE: decrypt paths verify the integrity tag before any
//! plaintext is produced, and fail closed on mismatch.

pub mod aead;
pub mod biometric;
pub mod hashing;
pub mod keys;
pub mod store;

// PUBLIC API: Re-export the primitives the rest of the workspace consumes
pub use aead::{AeadProvider, DerivedKeyProvider, EncryptedPayload, GcmProvider};
pub use hashing::{constant_time_eq, secure_id, sha256_hex};
pub use keys::{KeyManager, KeyProvenance, MasterKey, MemorySecretStore, SecretStore};
pub use store::{KeyValueStore, MemoryKvStore, SecureObjectStore, SqliteKvStore};
