//! Structured errors for store operations.
//!
//! Every public operation reports which of the four failure kinds it hit, so
//! callers can branch on the outcome instead of parsing log output:
//! - `NotFound`: no copy of the record exists anywhere.
//! - `Transport`: the remote API call did not complete (non-2xx or
//!   connection error) and no local fallback applied.
//! - `Decode`: malformed JSON or failed decryption. Never partial data.
//! - `LocalIo`: filesystem failure on the backup path. Never swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No record stored under this key, remotely or locally.
    #[error("no record found for key `{0}`")]
    NotFound(String),

    /// Network or host API failure. Non-2xx status codes and connection
    /// errors both land here: either way the operation did not complete.
    #[error("remote transport failure: {0}")]
    Transport(String),

    /// The stored bytes could not be turned back into a record: malformed
    /// JSON, wrong encryption key, or truncated/tampered ciphertext.
    #[error("failed to decode record: {0}")]
    Decode(String),

    /// Filesystem error on the local backup path (permissions, disk full).
    #[error("local backup I/O failure at {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Transport error for an unexpected HTTP status on a given path.
    pub fn status(status: reqwest::StatusCode, path: &str) -> Self {
        StoreError::Transport(format!("unexpected status {} for {}", status, path))
    }

    /// LocalIo error tagged with the file it happened on.
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::LocalIo {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}
