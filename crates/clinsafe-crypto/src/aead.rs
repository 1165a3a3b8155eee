// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Authenticated encryption: AES-256-GCM primary path (payload version 2)
// and a derived-keystream + HMAC fallback (payload version 1) for platforms
// without a native AEAD. Both paths verify the integrity tag before any
// plaintext is released.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use clinsafe_core::error::{ClinsafeError, Result};

/// Length of the per-call initialisation vector in bytes.
pub const IV_LEN: usize = 12;
/// Length of the integrity tag in bytes.
pub const TAG_LEN: usize = 16;
/// Length of the master key in bytes.
pub const KEY_LEN: usize = 32;

/// One authenticated-encryption result, as persisted to the key-value store.
///
/// All byte fields are hex-encoded for storage. `version` selects the
/// algorithm variant that produced the payload, so records written before an
/// algorithm upgrade remain decryptable.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub ciphertext: String,
    pub iv: String,
    pub tag: String,
    pub version: u8,
}

// Ciphertext contents stay out of Debug output; lengths are enough for
// diagnostics.
impl std::fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedPayload")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv_len", &self.iv.len())
            .field("tag_len", &self.tag.len())
            .field("version", &self.version)
            .finish()
    }
}

impl EncryptedPayload {
    fn decode_fields(&self) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
        let ciphertext = hex::decode(&self.ciphertext)
            .map_err(|_| ClinsafeError::Decryption("malformed ciphertext encoding".into()))?;
        let iv = hex::decode(&self.iv)
            .map_err(|_| ClinsafeError::Decryption("malformed iv encoding".into()))?;
        let tag = hex::decode(&self.tag)
            .map_err(|_| ClinsafeError::Decryption("malformed tag encoding".into()))?;
        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(ClinsafeError::Decryption("unexpected field length".into()));
        }
        Ok((ciphertext, iv, tag))
    }
}

/// Strategy seam for the platform-capability branch: native AEAD where the
/// platform provides one, derived-keystream fallback where it does not.
/// Selected once at startup; the rest of the code is oblivious to which is
/// active.
pub trait AeadProvider {
    /// Encrypt `plaintext` under `key` with a fresh random IV.
    fn seal(&self, key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<EncryptedPayload>;

    /// Verify the payload's tag and decrypt. Tag mismatch fails closed with
    /// `ClinsafeError::IntegrityFailure`; no partial plaintext is released.
    fn open(&self, key: &[u8; KEY_LEN], payload: &EncryptedPayload) -> Result<Vec<u8>>;

    /// The `version` value this provider stamps on its payloads.
    fn version(&self) -> u8;
}

/// Select the provider that can open a payload of the given version.
pub fn provider_for_version(version: u8) -> Result<Box<dyn AeadProvider>> {
    match version {
        2 => Ok(Box::new(GcmProvider)),
        1 => Ok(Box::new(DerivedKeyProvider)),
        other => Err(ClinsafeError::UnsupportedVersion(other)),
    }
}

fn fresh_iv() -> Result<[u8; IV_LEN]> {
    let rng = SystemRandom::new();
    let mut iv = [0u8; IV_LEN];
    rng.fill(&mut iv)
        .map_err(|_| ClinsafeError::KeyGeneration("system RNG unavailable".into()))?;
    Ok(iv)
}

// ---------------------------------------------------------------------------
// Version 2: native AES-256-GCM
// ---------------------------------------------------------------------------

/// AES-256-GCM provider (payload version 2). The preferred path wherever the
/// platform crypto library is available.
pub struct GcmProvider;

impl AeadProvider for GcmProvider {
    #[instrument(skip_all, fields(plaintext_len = plaintext.len()))]
    fn seal(&self, key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<EncryptedPayload> {
        let iv = fresh_iv()?;

        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| ClinsafeError::Encryption("invalid key material".into()))?;
        let sealing_key = LessSafeKey::new(unbound);

        let mut in_out = plaintext.to_vec();
        sealing_key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(iv),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| ClinsafeError::Encryption("AEAD seal failed".into()))?;

        // ring appends the 16-byte tag to the ciphertext; store it separately.
        let tag = in_out.split_off(in_out.len() - TAG_LEN);

        debug!(ciphertext_len = in_out.len(), "sealed payload (v2)");
        Ok(EncryptedPayload {
            ciphertext: hex::encode(in_out),
            iv: hex::encode(iv),
            tag: hex::encode(tag),
            version: 2,
        })
    }

    #[instrument(skip_all)]
    fn open(&self, key: &[u8; KEY_LEN], payload: &EncryptedPayload) -> Result<Vec<u8>> {
        let (ciphertext, iv, tag) = payload.decode_fields()?;

        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| ClinsafeError::Decryption("invalid key material".into()))?;
        let opening_key = LessSafeKey::new(unbound);

        let mut nonce_bytes = [0u8; IV_LEN];
        nonce_bytes.copy_from_slice(&iv);

        let mut in_out = ciphertext;
        in_out.extend_from_slice(&tag);

        // GCM verifies the tag in constant time before releasing plaintext.
        let plaintext = opening_key
            .open_in_place(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| ClinsafeError::IntegrityFailure)?;

        debug!(plaintext_len = plaintext.len(), "opened payload (v2)");
        Ok(plaintext.to_vec())
    }

    fn version(&self) -> u8 {
        2
    }
}

// ---------------------------------------------------------------------------
// Version 1: derived keystream + HMAC fallback
// ---------------------------------------------------------------------------

/// Fallback provider (payload version 1) for platforms without a native
/// AEAD: a SHA-256-derived keystream XORed over the plaintext, authenticated
/// with a truncated HMAC-SHA256 tag.
///
/// Known compromise inherited from the original deployment: the keystream is
/// derived with a single SHA-256 pass over key‖iv‖counter rather than a
/// vetted KDF. Tag verification is still mandatory; the XOR stream without
/// it offers no tamper detection.
pub struct DerivedKeyProvider;

impl DerivedKeyProvider {
    fn keystream_apply(key: &[u8; KEY_LEN], iv: &[u8], data: &mut [u8]) {
        for (block_index, chunk) in data.chunks_mut(32).enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(key);
            hasher.update(iv);
            hasher.update((block_index as u32).to_be_bytes());
            let block = hasher.finalize();
            for (byte, pad) in chunk.iter_mut().zip(block.iter()) {
                *byte ^= pad;
            }
        }
    }

    fn compute_tag(key: &[u8; KEY_LEN], iv: &[u8], ciphertext: &[u8]) -> [u8; TAG_LEN] {
        let hmac_key = hmac::Key::new(hmac::HMAC_SHA256, key);
        let mut message = Vec::with_capacity(iv.len() + ciphertext.len());
        message.extend_from_slice(iv);
        message.extend_from_slice(ciphertext);
        let signature = hmac::sign(&hmac_key, &message);

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&signature.as_ref()[..TAG_LEN]);
        tag
    }
}

impl AeadProvider for DerivedKeyProvider {
    #[instrument(skip_all, fields(plaintext_len = plaintext.len()))]
    fn seal(&self, key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<EncryptedPayload> {
        let iv = fresh_iv()?;

        let mut ciphertext = plaintext.to_vec();
        Self::keystream_apply(key, &iv, &mut ciphertext);
        let tag = Self::compute_tag(key, &iv, &ciphertext);

        debug!(ciphertext_len = ciphertext.len(), "sealed payload (v1)");
        Ok(EncryptedPayload {
            ciphertext: hex::encode(ciphertext),
            iv: hex::encode(iv),
            tag: hex::encode(tag),
            version: 1,
        })
    }

    #[instrument(skip_all)]
    fn open(&self, key: &[u8; KEY_LEN], payload: &EncryptedPayload) -> Result<Vec<u8>> {
        let (ciphertext, iv, tag) = payload.decode_fields()?;

        // Verify before decrypting; never release unauthenticated bytes.
        let expected = Self::compute_tag(key, &iv, &ciphertext);
        if !crate::hashing::constant_time_eq(&expected, &tag) {
            return Err(ClinsafeError::IntegrityFailure);
        }

        let mut plaintext = ciphertext;
        Self::keystream_apply(key, &iv, &mut plaintext);

        debug!(plaintext_len = plaintext.len(), "opened payload (v1)");
        Ok(plaintext)
    }

    fn version(&self) -> u8 {
        1
    }
}
