// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Secure object store: serialize, seal, and persist arbitrary values as
// opaque strings; reverse on read. Records written before encryption was
// enabled are recognised structurally and passed through for migration.

use std::path::Path;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use clinsafe_core::error::{ClinsafeError, Result};

use crate::aead::{provider_for_version, AeadProvider, EncryptedPayload, GcmProvider};
use crate::keys::MasterKey;

// ---------------------------------------------------------------------------
// Key-value persistence seam
// ---------------------------------------------------------------------------

/// The platform key-value store the app persists through. Reliable but dumb:
/// no transactions across keys, string values only.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-memory key-value store for tests.
#[derive(Default)]
pub struct MemoryKvStore {
    items: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| ClinsafeError::Storage("kv store poisoned".into()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| ClinsafeError::Storage("kv store poisoned".into()))?;
        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| ClinsafeError::Storage("kv store poisoned".into()))?;
        items.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| ClinsafeError::Storage("kv store poisoned".into()))?;
        items.clear();
        Ok(())
    }
}

/// Convert a `rusqlite::Error` into a `ClinsafeError::Database`.
fn db_err(e: rusqlite::Error) -> ClinsafeError {
    ClinsafeError::Database(e.to_string())
}

/// Durable key-value store backed by a single-table SQLite database.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Open (or create) the store at `path`. WAL mode is enabled for better
    /// concurrent-read performance.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;").map_err(db_err)?;
        Self::init_schema(&conn)?;
        debug!("kv store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory store (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init_schema(&conn)?;
        debug!("in-memory kv store opened");
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(db_err)
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(db_err)?;
        let mut rows = stmt.query(params![key]).map_err(db_err)?;
        match rows.next().map_err(db_err)? {
            Some(row) => Ok(Some(row.get(0).map_err(db_err)?)),
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(db_err)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM kv", []).map_err(db_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Secure object store
// ---------------------------------------------------------------------------

/// Encrypts JSON-serializable values into opaque envelope strings and back.
///
/// Sealing always uses the configured provider; opening dispatches on the
/// payload's `version` field so pre-upgrade records stay readable.
pub struct SecureObjectStore {
    key: MasterKey,
    provider: Box<dyn AeadProvider>,
}

impl SecureObjectStore {
    /// Build a store sealing with the native AES-256-GCM provider.
    pub fn new(key: MasterKey) -> Self {
        Self {
            key,
            provider: Box::new(GcmProvider),
        }
    }

    /// Build a store with an explicit provider (capability fallback).
    pub fn with_provider(key: MasterKey, provider: Box<dyn AeadProvider>) -> Self {
        Self { key, provider }
    }

    pub fn key(&self) -> &MasterKey {
        &self.key
    }

    /// Serialize `value` to JSON, seal it, and return the envelope as one
    /// opaque string for the key-value store.
    #[instrument(skip_all)]
    pub fn encrypt_object<T: Serialize>(&self, value: &T) -> Result<String> {
        let plaintext = serde_json::to_string(value)?;
        let payload = self.provider.seal(self.key.bytes(), plaintext.as_bytes())?;
        Ok(serde_json::to_string(&payload)?)
    }

    /// Parse an envelope string, verify and open it, and deserialize the
    /// recovered JSON.
    #[instrument(skip_all)]
    pub fn decrypt_object<T: DeserializeOwned>(&self, serialized: &str) -> Result<T> {
        let payload: EncryptedPayload = serde_json::from_str(serialized)
            .map_err(|_| ClinsafeError::Decryption("malformed envelope".into()))?;
        let provider = provider_for_version(payload.version)?;
        let plaintext = provider.open(self.key.bytes(), &payload)?;
        let text = String::from_utf8(plaintext)
            .map_err(|_| ClinsafeError::Decryption("recovered plaintext is not UTF-8".into()))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Encrypt `value` and write it under `key`.
    pub fn put<T: Serialize>(&self, kv: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
        let envelope = self.encrypt_object(value)?;
        kv.set_item(key, &envelope)
    }

    /// Read and decrypt the value under `key`.
    ///
    /// Records written before encryption was enabled are detected via
    /// `is_encrypted_payload` and parsed as plaintext JSON, the one-time
    /// migration path. Re-writing them encrypted is the caller's job.
    pub fn fetch<T: DeserializeOwned>(
        &self,
        kv: &dyn KeyValueStore,
        key: &str,
    ) -> Result<Option<T>> {
        let Some(raw) = kv.get_item(key)? else {
            return Ok(None);
        };
        if is_encrypted_payload(&raw) {
            Ok(Some(self.decrypt_object(&raw)?))
        } else {
            debug!(%key, "legacy plaintext record, migration pending");
            Ok(Some(serde_json::from_str(&raw)?))
        }
    }
}

/// Structural check distinguishing encrypted envelopes from legacy plaintext
/// records. Never panics on arbitrary input; garbage returns false.
pub fn is_encrypted_payload(raw: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return false;
    };
    let Some(object) = value.as_object() else {
        return false;
    };
    object.len() == 4
        && object.get("ciphertext").is_some_and(|v| v.is_string())
        && object.get("iv").is_some_and(|v| v.is_string())
        && object.get("tag").is_some_and(|v| v.is_string())
        && object.get("version").is_some_and(|v| v.is_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyManager, MemorySecretStore};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct HealthProfile {
        conditions: Vec<String>,
        has_lab_work: bool,
    }

    fn make_store() -> SecureObjectStore {
        let secrets = MemorySecretStore::new();
        let key = KeyManager::get_or_create(&secrets).unwrap();
        SecureObjectStore::new(key)
    }

    fn sample_profile() -> HealthProfile {
        HealthProfile {
            conditions: vec!["pregnancy".into(), "recent_tan".into()],
            has_lab_work: false,
        }
    }

    #[test]
    fn object_round_trip() {
        let store = make_store();
        let profile = sample_profile();

        let envelope = store.encrypt_object(&profile).unwrap();
        assert!(!envelope.contains("pregnancy"), "plaintext leaked into envelope");

        let recovered: HealthProfile = store.decrypt_object(&envelope).unwrap();
        assert_eq!(recovered, profile);
    }

    #[test]
    fn malformed_envelope_is_a_decryption_error() {
        let store = make_store();
        let result = store.decrypt_object::<HealthProfile>("{\"not\": \"an envelope\"}");
        assert!(matches!(result, Err(ClinsafeError::Decryption(_))));
    }

    #[test]
    fn tampered_envelope_fails_integrity() {
        let store = make_store();
        let envelope = store.encrypt_object(&sample_profile()).unwrap();

        let mut payload: EncryptedPayload = serde_json::from_str(&envelope).unwrap();
        let mut bytes = hex::decode(&payload.ciphertext).unwrap();
        bytes[0] ^= 0xff;
        payload.ciphertext = hex::encode(bytes);
        let tampered = serde_json::to_string(&payload).unwrap();

        assert!(matches!(
            store.decrypt_object::<HealthProfile>(&tampered),
            Err(ClinsafeError::IntegrityFailure)
        ));
    }

    #[test]
    fn envelope_shape_is_recognised() {
        let store = make_store();
        let envelope = store.encrypt_object(&sample_profile()).unwrap();
        assert!(is_encrypted_payload(&envelope));
    }

    #[test]
    fn garbage_is_not_an_envelope() {
        for raw in [
            "",
            "not json at all",
            "42",
            "[1,2,3]",
            "{\"ciphertext\": \"aa\"}",
            "{\"ciphertext\": \"aa\", \"iv\": \"bb\", \"tag\": \"cc\", \"version\": \"two\"}",
            "{\"ciphertext\": \"aa\", \"iv\": \"bb\", \"tag\": \"cc\", \"version\": 2, \"extra\": 1}",
        ] {
            assert!(!is_encrypted_payload(raw), "accepted: {raw}");
        }
    }

    #[test]
    fn put_fetch_round_trip_sqlite() {
        let store = make_store();
        let kv = SqliteKvStore::open_in_memory().unwrap();
        let profile = sample_profile();

        store.put(&kv, "health_profile", &profile).unwrap();

        // On-disk value must be an opaque envelope, not patient data.
        let raw = kv.get_item("health_profile").unwrap().unwrap();
        assert!(is_encrypted_payload(&raw));
        assert!(!raw.contains("pregnancy"));

        let fetched: Option<HealthProfile> = store.fetch(&kv, "health_profile").unwrap();
        assert_eq!(fetched, Some(profile));
    }

    #[test]
    fn fetch_passes_through_legacy_plaintext() {
        let store = make_store();
        let kv = MemoryKvStore::new();
        let legacy = serde_json::to_string(&sample_profile()).unwrap();
        kv.set_item("health_profile", &legacy).unwrap();

        let fetched: Option<HealthProfile> = store.fetch(&kv, "health_profile").unwrap();
        assert_eq!(fetched, Some(sample_profile()));
    }

    #[test]
    fn fetch_missing_key_is_none() {
        let store = make_store();
        let kv = MemoryKvStore::new();
        let fetched: Option<HealthProfile> = store.fetch(&kv, "absent").unwrap();
        assert!(fetched.is_none());
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinsafe.db");

        {
            let kv = SqliteKvStore::open(&path).unwrap();
            kv.set_item("k", "v").unwrap();
        }
        let kv = SqliteKvStore::open(&path).unwrap();
        assert_eq!(kv.get_item("k").unwrap().as_deref(), Some("v"));

        kv.remove_item("k").unwrap();
        assert!(kv.get_item("k").unwrap().is_none());
    }
}
