// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-way hashing, constant-time comparison, and secure identifiers.

use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use clinsafe_core::error::{ClinsafeError, Result};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
///
/// Used for biometric fingerprinting and content hashing, not for password
/// storage.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Constant-time equality over byte slices.
///
/// Unequal lengths return false without timing leakage concerns (length is
/// not secret for the tags this guards).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    // Accumulate the XOR of every byte pair so the comparison touches the
    // whole slice regardless of where a mismatch sits.
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Generate a v4 UUID from 128 bits of CSPRNG output.
///
/// Used for audit entry identifiers and biometric nonce material. Fails with
/// `KeyGeneration` when the platform RNG is unavailable; never falls back to
/// weaker randomness.
pub fn secure_id() -> Result<Uuid> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes)
        .map_err(|_| ClinsafeError::KeyGeneration("system RNG unavailable".into()))?;
    Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
    }

    #[test]
    fn hash_known_value() {
        // SHA-256("hello"), verified against coreutils sha256sum.
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(sha256_hex(b"hello"), expected);
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(sha256_hex(b"clinsafe"), sha256_hex(b"clinsafe"));
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        assert!(!constant_time_eq(b"xbcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abcde"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn secure_ids_are_distinct_and_v4_shaped() {
        let a = secure_id().unwrap();
        let b = secure_id().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.get_version_num(), 4);
    }
}
