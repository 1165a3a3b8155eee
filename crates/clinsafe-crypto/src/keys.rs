// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Master-key lifecycle over the platform keychain. The key is generated
// once, stored hex-encoded under a fixed alias, and loaded on every launch.
// If the keychain is unreachable the process still gets a usable key, but
// the provenance flags the degraded state so callers can surface it.

use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use clinsafe_core::error::{ClinsafeError, Result};

use crate::aead::KEY_LEN;
use crate::hashing::sha256_hex;

/// Keychain alias under which the master key is stored.
pub const MASTER_KEY_ALIAS: &str = "clinsafe.master_key";

/// Secure key storage in the platform keychain / keystore.
///
/// The one seam the crypto layer has on the host OS. Implementations must
/// resist casual extraction (device keychain or keystore equivalent).
pub trait SecretStore {
    /// Retrieve a secret by alias. Returns None if not found.
    fn get_secret(&self, alias: &str) -> Result<Option<String>>;

    /// Store a secret under the given alias.
    fn set_secret(&self, alias: &str, value: &str) -> Result<()>;

    /// Delete a secret by alias.
    fn delete_secret(&self, alias: &str) -> Result<()>;
}

/// In-memory secret store for tests and for hosts without a keychain.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(&self, alias: &str) -> Result<Option<String>> {
        let secrets = self
            .secrets
            .lock()
            .map_err(|_| ClinsafeError::SecureStorage("secret store poisoned".into()))?;
        Ok(secrets.get(alias).cloned())
    }

    fn set_secret(&self, alias: &str, value: &str) -> Result<()> {
        let mut secrets = self
            .secrets
            .lock()
            .map_err(|_| ClinsafeError::SecureStorage("secret store poisoned".into()))?;
        secrets.insert(alias.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete_secret(&self, alias: &str) -> Result<()> {
        let mut secrets = self
            .secrets
            .lock()
            .map_err(|_| ClinsafeError::SecureStorage("secret store poisoned".into()))?;
        secrets.remove(alias);
        Ok(())
    }
}

/// Where the current master key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyProvenance {
    /// Loaded from the keychain.
    Stored,
    /// Freshly generated and persisted to the keychain.
    Generated,
    /// Keychain unavailable; the key lives only in this process. Anything
    /// encrypted under it is unrecoverable after restart; callers must
    /// surface this degraded state to the operator.
    EphemeralFallback,
}

/// The 32-byte symmetric master key. Zeroised on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
    #[zeroize(skip)]
    provenance: KeyProvenance,
}

impl MasterKey {
    pub fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub fn provenance(&self) -> KeyProvenance {
        self.provenance
    }

    /// True when the key is not backed by the keychain.
    pub fn is_degraded(&self) -> bool {
        self.provenance == KeyProvenance::EphemeralFallback
    }

    /// Hash-derived fingerprint for identification, not key material.
    pub fn fingerprint(&self) -> String {
        sha256_hex(&self.bytes)[..16].to_owned()
    }
}

// Key bytes stay out of Debug output.
impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("fingerprint", &self.fingerprint())
            .field("provenance", &self.provenance)
            .finish()
    }
}

/// Generate a fresh 32-byte key from the system CSPRNG.
///
/// Fails with `KeyGeneration` when the RNG is unavailable; never retried
/// with weaker randomness.
pub fn generate_key() -> Result<[u8; KEY_LEN]> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; KEY_LEN];
    rng.fill(&mut bytes)
        .map_err(|_| ClinsafeError::KeyGeneration("system RNG unavailable".into()))?;
    Ok(bytes)
}

/// Master-key retrieval and rotation over a `SecretStore`.
pub struct KeyManager;

impl KeyManager {
    /// Load the master key from the keychain, generating and persisting one
    /// on first use.
    ///
    /// When the keychain itself is unreachable, an ephemeral key is returned
    /// with `KeyProvenance::EphemeralFallback` rather than failing the whole
    /// process. Provenance records the degraded state.
    pub fn get_or_create(store: &dyn SecretStore) -> Result<MasterKey> {
        match store.get_secret(MASTER_KEY_ALIAS) {
            Ok(Some(stored)) => {
                let bytes = decode_stored_key(&stored)?;
                debug!("master key loaded from keychain");
                Ok(MasterKey {
                    bytes,
                    provenance: KeyProvenance::Stored,
                })
            }
            Ok(None) => {
                let bytes = generate_key()?;
                match store.set_secret(MASTER_KEY_ALIAS, &hex::encode(bytes)) {
                    Ok(()) => {
                        info!("master key generated and persisted");
                        Ok(MasterKey {
                            bytes,
                            provenance: KeyProvenance::Generated,
                        })
                    }
                    Err(e) => {
                        warn!(error = %e, "keychain write failed, using ephemeral key");
                        Ok(MasterKey {
                            bytes,
                            provenance: KeyProvenance::EphemeralFallback,
                        })
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "keychain unreachable, using ephemeral key");
                let bytes = generate_key()?;
                Ok(MasterKey {
                    bytes,
                    provenance: KeyProvenance::EphemeralFallback,
                })
            }
        }
    }

    /// Replace the stored master key with a freshly generated one.
    ///
    /// Disruptive maintenance operation: payloads sealed under the previous
    /// key become undecryptable. There is no automatic re-encryption; callers
    /// must re-encrypt dependent data before discarding the old key.
    pub fn rotate(store: &dyn SecretStore) -> Result<MasterKey> {
        let bytes = generate_key()?;
        store.set_secret(MASTER_KEY_ALIAS, &hex::encode(bytes))?;
        info!("master key rotated");
        Ok(MasterKey {
            bytes,
            provenance: KeyProvenance::Generated,
        })
    }
}

fn decode_stored_key(stored: &str) -> Result<[u8; KEY_LEN]> {
    let decoded = hex::decode(stored)
        .map_err(|_| ClinsafeError::SecureStorage("stored key is not valid hex".into()))?;
    let bytes: [u8; KEY_LEN] = decoded
        .try_into()
        .map_err(|_| ClinsafeError::SecureStorage("stored key has wrong length".into()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Secret store that fails every operation, simulating a locked or
    /// missing keychain.
    struct BrokenSecretStore;

    impl SecretStore for BrokenSecretStore {
        fn get_secret(&self, _alias: &str) -> Result<Option<String>> {
            Err(ClinsafeError::SecureStorage("keychain locked".into()))
        }
        fn set_secret(&self, _alias: &str, _value: &str) -> Result<()> {
            Err(ClinsafeError::SecureStorage("keychain locked".into()))
        }
        fn delete_secret(&self, _alias: &str) -> Result<()> {
            Err(ClinsafeError::SecureStorage("keychain locked".into()))
        }
    }

    #[test]
    fn first_use_generates_and_persists() {
        let store = MemorySecretStore::new();
        let key = KeyManager::get_or_create(&store).unwrap();
        assert_eq!(key.provenance(), KeyProvenance::Generated);
        assert!(!key.is_degraded());

        let stored = store.get_secret(MASTER_KEY_ALIAS).unwrap().unwrap();
        assert_eq!(stored, hex::encode(key.bytes()));
    }

    #[test]
    fn second_use_loads_same_key() {
        let store = MemorySecretStore::new();
        let first = KeyManager::get_or_create(&store).unwrap();
        let second = KeyManager::get_or_create(&store).unwrap();
        assert_eq!(second.provenance(), KeyProvenance::Stored);
        assert_eq!(first.bytes(), second.bytes());
    }

    #[test]
    fn broken_keychain_yields_ephemeral_key() {
        let key = KeyManager::get_or_create(&BrokenSecretStore).unwrap();
        assert_eq!(key.provenance(), KeyProvenance::EphemeralFallback);
        assert!(key.is_degraded());
    }

    #[test]
    fn rotation_replaces_stored_key() {
        let store = MemorySecretStore::new();
        let old = KeyManager::get_or_create(&store).unwrap();
        let new = KeyManager::rotate(&store).unwrap();
        assert_ne!(old.bytes(), new.bytes());

        let reloaded = KeyManager::get_or_create(&store).unwrap();
        assert_eq!(reloaded.bytes(), new.bytes());
    }

    #[test]
    fn rotation_propagates_keychain_failure() {
        assert!(KeyManager::rotate(&BrokenSecretStore).is_err());
    }

    #[test]
    fn malformed_stored_key_is_rejected() {
        let store = MemorySecretStore::new();
        store.set_secret(MASTER_KEY_ALIAS, "not-hex").unwrap();
        assert!(KeyManager::get_or_create(&store).is_err());
    }

    #[test]
    fn debug_output_hides_key_bytes() {
        let store = MemorySecretStore::new();
        let key = KeyManager::get_or_create(&store).unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains(&hex::encode(key.bytes())));
        assert!(debug.contains("fingerprint"));
    }
}
