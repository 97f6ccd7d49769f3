//! Key/value store - arbitrary JSON values under the `data/` namespace.
//!
//! Remote file for key K is `data/K.json` holding the bare JSON value
//! (`69`, `"text"`, an object...), not a wrapper object.

use crate::error::Result;
use crate::store::{AllRecords, DeleteOutcome, LoadSource, RecordStore, SaveOutcome};
use serde::Serialize;
use serde_json::Value;

const NAMESPACE: &str = "data";

/// A loaded key/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

/// Facade over [`RecordStore`] for the `data` namespace.
pub struct DataStore {
    store: RecordStore,
}

impl DataStore {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Save a value under a key.
    pub fn save<T: Serialize>(&self, key: &str, value: &T, encrypt: bool) -> Result<SaveOutcome> {
        let value = serde_json::to_value(value)?;
        self.store.save(NAMESPACE, key, &value, encrypt)
    }

    /// Load the value stored under a key.
    pub fn load(&self, key: &str, encrypt: bool) -> Result<KeyValue> {
        let loaded = self.store.load(NAMESPACE, key, encrypt)?;
        Ok(KeyValue {
            key: key.to_string(),
            value: loaded.value,
        })
    }

    /// Like [`load`](Self::load), but also reports which copy was used.
    pub fn load_with_source(&self, key: &str, encrypt: bool) -> Result<(KeyValue, LoadSource)> {
        let loaded = self.store.load(NAMESPACE, key, encrypt)?;
        Ok((
            KeyValue {
                key: key.to_string(),
                value: loaded.value,
            },
            loaded.source,
        ))
    }

    /// Delete the remote copy; the local backup only when `delete_local`.
    pub fn delete(&self, key: &str, delete_local: bool) -> Result<DeleteOutcome> {
        self.store.delete(NAMESPACE, key, delete_local)
    }

    /// All stored key/value pairs, skipping undecodable entries per key.
    pub fn get_all(&self, encrypt: bool) -> Result<AllRecords> {
        self.store.get_all(NAMESPACE, encrypt)
    }

    /// The underlying record store, for raw file transfer.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }
}
