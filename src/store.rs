//! Reconciliation core - decides between the remote copy and the local
//! backup and keeps the chosen side propagated.
//!
//! Every public operation starts with a connectivity probe, performs at
//! most one remote round trip and one backup I/O step, and reports which
//! branch it took through its outcome type. Nothing here coordinates
//! concurrent callers: two writers on the same key are last-writer-wins,
//! and concurrent environments need external mutual exclusion per key.

use crate::backup::LocalBackup;
use crate::config::Config;
use crate::crypto::{Encryptor, KEY_LEN};
use crate::error::{Result, StoreError};
use crate::net::{Connectivity, HttpProbe};
use crate::record::{self, Fields};
use crate::remote::{GitHubRemote, Remote, RemoteDeleteStatus};
use serde_json::Value;
use std::path::Path;

/// Which copy a load ended up returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The remote copy was authoritative.
    Remote,
    /// The local backup was used (offline, remote absent, or remote
    /// unreachable).
    Local,
    /// The local backup was strictly newer than the remote copy and was
    /// pushed forward as a new remote write.
    LocalSynced,
}

/// A loaded record plus the branch that produced it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub value: Value,
    pub source: LoadSource,
}

/// Where a save landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Remote write succeeded and the local backup was refreshed with it.
    RemoteAndLocal,
    /// Offline, or the remote write failed: only the local backup was
    /// written.
    LocalOnly,
}

/// Remote half of a delete outcome. Remote failures are reported here
/// instead of raised, so they never block an explicit local delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteDelete {
    Deleted,
    NotFound,
    Failed(String),
    /// Offline; no remote call was attempted.
    Skipped,
}

/// Outcome of a delete.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub remote: RemoteDelete,
    /// True iff a local backup existed and was removed (only ever true when
    /// local deletion was requested).
    pub local_removed: bool,
}

/// Result of enumerating a namespace. A single undecodable entry lands in
/// `failed` and never aborts the rest.
#[derive(Debug)]
pub struct AllRecords {
    /// Decoded records by key, in enumeration order.
    pub records: Fields,
    /// Keys that could not be fetched or decoded, with the reason.
    pub failed: Vec<(String, StoreError)>,
}

/// The store: remote client + encrypted local backup + reconciliation.
///
/// Remote and probe are injected as trait objects so tests run against an
/// in-memory remote and a fixed-value probe.
pub struct RecordStore {
    remote: Box<dyn Remote>,
    probe: Box<dyn Connectivity>,
    backup: LocalBackup,
    encryptor: Encryptor,
}

impl RecordStore {
    pub fn new(
        remote: Box<dyn Remote>,
        probe: Box<dyn Connectivity>,
        backup: LocalBackup,
        key: &[u8; KEY_LEN],
    ) -> Self {
        Self {
            remote,
            probe,
            backup,
            encryptor: Encryptor::new(key),
        }
    }

    /// Production wiring: GitHub remote + HTTP probe, per config.
    pub fn from_config(config: &Config, key: &[u8; KEY_LEN]) -> anyhow::Result<Self> {
        let remote = GitHubRemote::new(&config.github, &config.http)?;
        let probe = HttpProbe::with_url(config.http.probe_url.clone());
        Ok(Self::new(
            Box::new(remote),
            Box::new(probe),
            LocalBackup::new(config.backup.dir.clone()),
            key,
        ))
    }

    fn remote_path(namespace: &str, key: &str) -> String {
        format!("{}/{}.json", namespace, key)
    }

    /// Save a record. Online: remote write first, then mirror the record
    /// into the local backup so both sides hold what was just published.
    /// Any remote failure degrades to a local-only save - a save never hard
    /// fails because the network did. Offline: local only, no remote call.
    pub fn save(&self, namespace: &str, key: &str, value: &Value, encrypt: bool) -> Result<SaveOutcome> {
        let path = Self::remote_path(namespace, key);
        let message = format!("Save {}", key);

        if !self.probe.is_online() {
            tracing::info!("[store] Offline, saving {} to local backup only", key);
            self.save_local(namespace, key, value)?;
            return Ok(SaveOutcome::LocalOnly);
        }

        let remote_bytes = record::encode(value, &self.encryptor, encrypt)?;
        match self.remote.put(&path, &remote_bytes, &message) {
            Ok(()) => {
                self.save_local(namespace, key, value)?;
                Ok(SaveOutcome::RemoteAndLocal)
            }
            Err(StoreError::Transport(e)) => {
                // The probe said online, but the call still didn't complete.
                tracing::warn!("[store] Remote save of {} failed ({}), keeping local backup only", key, e);
                self.save_local(namespace, key, value)?;
                Ok(SaveOutcome::LocalOnly)
            }
            Err(other) => Err(other),
        }
    }

    /// Load a record.
    ///
    /// Online, both copies present: the timestamps come from two unrelated
    /// clocks (the host's commit time vs the filesystem mtime), so the
    /// comparison is a strict `>` with no sub-second assumptions; ties go
    /// to the remote copy. A strictly newer local copy is returned and
    /// pushed forward as one remote write.
    pub fn load(&self, namespace: &str, key: &str, encrypt: bool) -> Result<Loaded> {
        let path = Self::remote_path(namespace, key);

        if !self.probe.is_online() {
            tracing::info!("[store] Offline, loading {} from local backup", key);
            return self.load_local(namespace, key);
        }

        let remote_file = match self.remote.get(&path) {
            Ok(file) => file,
            Err(StoreError::Transport(e)) => {
                tracing::warn!("[store] Remote load of {} failed ({}), falling back to local backup", key, e);
                return self.load_local(namespace, key);
            }
            Err(other) => return Err(other),
        };
        let local_blob = self.backup.load(namespace, key)?;

        match (remote_file, local_blob) {
            (None, None) => Err(StoreError::NotFound(key.to_string())),
            (None, Some(blob)) => {
                // No remote target to sync against; plain local load.
                let value = record::decode(&blob, &self.encryptor, true)?;
                Ok(Loaded {
                    value,
                    source: LoadSource::Local,
                })
            }
            (Some(file), None) => {
                let value = record::decode(&file.content, &self.encryptor, encrypt)?;
                Ok(Loaded {
                    value,
                    source: LoadSource::Remote,
                })
            }
            (Some(file), Some(blob)) => {
                if self.local_is_newer(namespace, key, &path)? {
                    let value = record::decode(&blob, &self.encryptor, true)?;
                    let source = self.sync_forward(&path, key, &value, encrypt);
                    Ok(Loaded { value, source })
                } else {
                    let value = record::decode(&file.content, &self.encryptor, encrypt)?;
                    Ok(Loaded {
                        value,
                        source: LoadSource::Remote,
                    })
                }
            }
        }
    }

    /// Delete the remote copy; remove the local backup only when asked.
    /// Remote failures are reported in the outcome, never raised, so they
    /// cannot block the local delete.
    pub fn delete(&self, namespace: &str, key: &str, delete_local: bool) -> Result<DeleteOutcome> {
        let path = Self::remote_path(namespace, key);
        let message = format!("Delete {}", key);

        let remote = if self.probe.is_online() {
            match self.remote.delete(&path, &message) {
                Ok(RemoteDeleteStatus::Deleted) => RemoteDelete::Deleted,
                Ok(RemoteDeleteStatus::NotFound) => RemoteDelete::NotFound,
                Err(e) => {
                    tracing::warn!("[store] Remote delete of {} failed: {}", key, e);
                    RemoteDelete::Failed(e.to_string())
                }
            }
        } else {
            tracing::info!("[store] Offline, skipping remote delete of {}", key);
            RemoteDelete::Skipped
        };

        let local_removed = if delete_local {
            self.backup.delete(namespace, key)?
        } else {
            false
        };

        Ok(DeleteOutcome {
            remote,
            local_removed,
        })
    }

    /// Enumerate every record in a namespace. Online this lists and decodes
    /// the remote directory; offline (or when the listing itself fails) it
    /// enumerates the local backups. Undecodable entries are collected in
    /// `failed` per key; the rest still come back.
    pub fn get_all(&self, namespace: &str, encrypt: bool) -> Result<AllRecords> {
        if !self.probe.is_online() {
            tracing::info!("[store] Offline, enumerating {} from local backups", namespace);
            return self.get_all_local(namespace);
        }

        let names = match self.remote.list(namespace) {
            Ok(names) => names,
            Err(StoreError::Transport(e)) => {
                tracing::warn!("[store] Remote listing of {} failed ({}), falling back to local backups", namespace, e);
                return self.get_all_local(namespace);
            }
            Err(other) => return Err(other),
        };

        let mut all = AllRecords {
            records: Fields::new(),
            failed: Vec::new(),
        };
        for name in names {
            let Some(key) = name.strip_suffix(".json") else {
                continue;
            };
            let entry = self
                .remote
                .get(&format!("{}/{}", namespace, name))
                .and_then(|file| match file {
                    Some(file) => record::decode(&file.content, &self.encryptor, encrypt),
                    None => Err(StoreError::NotFound(key.to_string())),
                });
            match entry {
                Ok(value) => {
                    all.records.insert(key.to_string(), value);
                }
                Err(e) => {
                    tracing::warn!("[store] Skipping {}/{}: {}", namespace, key, e);
                    all.failed.push((key.to_string(), e));
                }
            }
        }
        Ok(all)
    }

    /// Copy a local file into the remote store as-is (no codec).
    pub fn upload_file(&self, local: &Path, remote_path: &str, message: &str) -> Result<()> {
        let content = std::fs::read(local).map_err(|e| StoreError::local_io(local, e))?;
        self.remote.put(remote_path, &content, message)
    }

    /// Fetch a remote file and write it to a local path as-is (no codec).
    pub fn download_file(&self, remote_path: &str, local: &Path) -> Result<()> {
        let file = self
            .remote
            .get(remote_path)?
            .ok_or_else(|| StoreError::NotFound(remote_path.to_string()))?;
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::local_io(parent, e))?;
        }
        std::fs::write(local, file.content).map_err(|e| StoreError::local_io(local, e))
    }

    /// Backup path for a key, for callers that need to point at the file.
    pub fn backup_path(&self, namespace: &str, key: &str) -> std::path::PathBuf {
        self.backup.file_path(namespace, key)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Backups are always encrypted, whatever the caller's flag says.
    fn save_local(&self, namespace: &str, key: &str, value: &Value) -> Result<()> {
        let blob = record::encode(value, &self.encryptor, true)?;
        self.backup.save(namespace, key, &blob)
    }

    fn load_local(&self, namespace: &str, key: &str) -> Result<Loaded> {
        let blob = self
            .backup
            .load(namespace, key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let value = record::decode(&blob, &self.encryptor, true)?;
        Ok(Loaded {
            value,
            source: LoadSource::Local,
        })
    }

    /// Strictly-newer comparison between the backup mtime and the remote
    /// last-modified time. Compared at whole-second precision: the host's
    /// commit timestamps carry no sub-second component, and the two clocks
    /// are unrelated anyway. Ties and unknown remote history keep the
    /// remote copy authoritative, so nothing is written.
    fn local_is_newer(&self, namespace: &str, key: &str, path: &str) -> Result<bool> {
        let local = self.backup.last_modified(namespace, key)?;
        let remote = match self.remote.last_modified(path) {
            Ok(ts) => ts,
            Err(StoreError::Transport(e)) => {
                tracing::warn!("[store] Could not fetch remote timestamp for {} ({}), keeping remote copy", key, e);
                return Ok(false);
            }
            Err(other) => return Err(other),
        };
        match (local, remote) {
            (Some(local), Some(remote)) => Ok(local.timestamp() > remote.timestamp()),
            _ => Ok(false),
        }
    }

    /// Push a winning local copy to the remote side. Push failure does not
    /// fail the load; the caller still gets the local value.
    fn sync_forward(&self, path: &str, key: &str, value: &Value, encrypt: bool) -> LoadSource {
        let message = format!("Sync local copy of {}", key);
        let bytes = match record::encode(value, &self.encryptor, encrypt) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("[store] Could not encode {} for sync: {}", key, e);
                return LoadSource::Local;
            }
        };
        match self.remote.put(path, &bytes, &message) {
            Ok(()) => {
                tracing::info!("[store] Local copy of {} was newer, pushed to remote", key);
                LoadSource::LocalSynced
            }
            Err(e) => {
                tracing::warn!("[store] Sync of {} to remote failed: {}", key, e);
                LoadSource::Local
            }
        }
    }

    fn get_all_local(&self, namespace: &str) -> Result<AllRecords> {
        let mut all = AllRecords {
            records: Fields::new(),
            failed: Vec::new(),
        };
        for key in self.backup.list(namespace)? {
            let entry = self
                .backup
                .load(namespace, &key)?
                .ok_or_else(|| StoreError::NotFound(key.clone()))
                .and_then(|blob| record::decode(&blob, &self.encryptor, true));
            match entry {
                Ok(value) => {
                    all.records.insert(key, value);
                }
                Err(e) => {
                    tracing::warn!("[store] Skipping local backup {}/{}: {}", namespace, key, e);
                    all.failed.push((key, e));
                }
            }
        }
        Ok(all)
    }
}
