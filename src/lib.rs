//! gitkv - JSON records in a GitHub repository, with an encrypted local
//! backup fallback.
//!
//! A "database" in the loosest sense: each record is one file in a GitHub
//! repo, written and read through the REST contents API. When the network
//! is unavailable (or a call fails mid-flight), operations degrade to an
//! AES-256-GCM-encrypted backup directory on disk, and a
//! newest-timestamp-wins rule reconciles the two copies on load.
//!
//! What this is not: a distributed store, a cache with eviction, or a
//! transactional system. One caller, blocking calls, last writer wins.

pub mod backup;
pub mod config;
pub mod crypto;
pub mod data;
pub mod error;
pub mod net;
pub mod players;
pub mod record;
pub mod remote;
pub mod store;

// Re-export main types
pub use backup::LocalBackup;
pub use config::Config;
pub use crypto::{derive_key, derive_key_new, generate_key, Encryptor, KEY_LEN};
pub use data::{DataStore, KeyValue};
pub use error::{Result, StoreError};
pub use net::{Connectivity, HttpProbe};
pub use players::PlayerStore;
pub use record::Fields;
pub use remote::{GitHubRemote, Remote, RemoteDeleteStatus, RemoteFile};
pub use store::{
    AllRecords, DeleteOutcome, LoadSource, Loaded, RecordStore, RemoteDelete, SaveOutcome,
};
