//! Player store - typed account records under the `players/` namespace.
//!
//! Accounts are plain serializable structs. Instead of the runtime
//! attribute introspection the original design used, the two save variants
//! are explicit: save every serialized field, or save a named subset.

use crate::error::Result;
use crate::record::{select_fields, to_fields};
use crate::store::{AllRecords, DeleteOutcome, LoadSource, RecordStore, SaveOutcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const NAMESPACE: &str = "players";

/// Facade over [`RecordStore`] for the `players` namespace.
pub struct PlayerStore {
    store: RecordStore,
}

impl PlayerStore {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Save an account. `fields = None` saves every serialized field;
    /// `fields = Some(names)` saves only the named subset (names missing
    /// from the record are skipped).
    pub fn save_account<T: Serialize>(
        &self,
        username: &str,
        player: &T,
        encrypt: bool,
        fields: Option<&[&str]>,
    ) -> Result<SaveOutcome> {
        let all = to_fields(player)?;
        let record = match fields {
            Some(names) => select_fields(&all, names),
            None => all,
        };
        self.store
            .save(NAMESPACE, username, &Value::Object(record), encrypt)
    }

    /// Load an account back into its typed form.
    pub fn load_account<T: DeserializeOwned>(&self, username: &str, encrypt: bool) -> Result<T> {
        let loaded = self.store.load(NAMESPACE, username, encrypt)?;
        Ok(serde_json::from_value(loaded.value)?)
    }

    /// Like [`load_account`](Self::load_account), but also reports which
    /// copy was used.
    pub fn load_account_with_source<T: DeserializeOwned>(
        &self,
        username: &str,
        encrypt: bool,
    ) -> Result<(T, LoadSource)> {
        let loaded = self.store.load(NAMESPACE, username, encrypt)?;
        Ok((serde_json::from_value(loaded.value)?, loaded.source))
    }

    /// Delete the remote account; the local backup only when `delete_local`.
    pub fn delete_account(&self, username: &str, delete_local: bool) -> Result<DeleteOutcome> {
        self.store.delete(NAMESPACE, username, delete_local)
    }

    /// All stored accounts as raw field maps, skipping undecodable entries
    /// per username.
    pub fn get_all(&self, encrypt: bool) -> Result<AllRecords> {
        self.store.get_all(NAMESPACE, encrypt)
    }

    /// The underlying record store, for raw file transfer.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }
}
