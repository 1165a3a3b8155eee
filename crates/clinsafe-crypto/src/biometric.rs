// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Biometric hashing: one-way digests of capture artifacts so that repeat
// visitors can be matched without persisting the artifact itself. The raw
// capture never leaves the intake flow.

use clinsafe_core::error::Result;

use crate::hashing::{secure_id, sha256_hex};

/// Number of hex characters in an approximate-match bucket key.
const MATCH_KEY_LEN: usize = 16;

/// Salted one-way fingerprint of a biometric capture artifact.
///
/// The nonce binds the fingerprint to one enrolment, so the same face
/// capture enrolled twice produces unlinkable fingerprints. Exact-match
/// verification only, not for password storage.
pub fn biometric_fingerprint(artifact: &[u8], nonce: &str) -> String {
    let mut salted = Vec::with_capacity(nonce.len() + artifact.len());
    salted.extend_from_slice(nonce.as_bytes());
    salted.extend_from_slice(artifact);
    sha256_hex(&salted)
}

/// Unsalted truncated digest used as a candidate-lookup bucket key.
///
/// Identical artifacts always land in the same bucket; the full salted
/// fingerprint disambiguates within it.
pub fn match_key(artifact: &[u8]) -> String {
    sha256_hex(artifact)[..MATCH_KEY_LEN].to_owned()
}

/// Fresh CSPRNG nonce for a new enrolment.
pub fn enrolment_nonce() -> Result<String> {
    Ok(secure_id()?.to_string())
}
