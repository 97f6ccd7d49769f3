//! Local backup store - encrypted record files on disk.
//!
//! Layout: `<root>/<namespace>/<key>.enc`, one file per record, always
//! containing an encrypted blob (the store never writes plaintext here).
//! The file's mtime is the only timestamp the local side has, and it is
//! what reconciliation compares against the remote's last-modified time.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension for backup files.
const BACKUP_EXT: &str = "enc";

/// Encrypted per-key backup files under a fixed root directory.
pub struct LocalBackup {
    root: PathBuf,
}

impl LocalBackup {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the backup file for a key.
    pub fn file_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root
            .join(namespace)
            .join(format!("{}.{}", key, BACKUP_EXT))
    }

    /// Write a backup, creating the namespace directory if missing and
    /// overwriting any prior content.
    pub fn save(&self, namespace: &str, key: &str, encrypted: &[u8]) -> Result<()> {
        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir).map_err(|e| StoreError::local_io(&dir, e))?;

        let path = self.file_path(namespace, key);
        fs::write(&path, encrypted).map_err(|e| StoreError::local_io(&path, e))?;

        tracing::debug!("[backup] Wrote {}", path.display());
        Ok(())
    }

    /// Read a backup. `None` when no file exists; any other failure is
    /// `LocalIo` and propagates.
    pub fn load(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.file_path(namespace, key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::local_io(&path, e)),
        }
    }

    /// Remove a backup. Returns true iff a file existed and was removed.
    pub fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let path = self.file_path(namespace, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::local_io(&path, e)),
        }
    }

    /// Filesystem mtime of a backup, as UTC. `None` when no file exists.
    pub fn last_modified(&self, namespace: &str, key: &str) -> Result<Option<DateTime<Utc>>> {
        let path = self.file_path(namespace, key);
        match fs::metadata(&path) {
            Ok(meta) => {
                let mtime = meta.modified().map_err(|e| StoreError::local_io(&path, e))?;
                Ok(Some(DateTime::<Utc>::from(mtime)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::local_io(&path, e)),
        }
    }

    /// Keys of all backups in a namespace (files with the `.enc` extension).
    /// A missing namespace directory means no backups yet, not an error.
    pub fn list(&self, namespace: &str) -> Result<Vec<String>> {
        let dir = self.root.join(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::local_io(&dir, e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::local_io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(BACKUP_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Root directory of the backup store.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_roundtrip() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let backup = LocalBackup::new(temp_dir.path());

        backup.save("players", "john_doe", b"blob")?;
        assert_eq!(backup.load("players", "john_doe")?, Some(b"blob".to_vec()));
        Ok(())
    }

    #[test]
    fn test_save_overwrites() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let backup = LocalBackup::new(temp_dir.path());

        backup.save("data", "k", b"old")?;
        backup.save("data", "k", b"new")?;
        assert_eq!(backup.load("data", "k")?, Some(b"new".to_vec()));
        Ok(())
    }

    #[test]
    fn test_load_missing_is_none() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let backup = LocalBackup::new(temp_dir.path());

        assert_eq!(backup.load("data", "missing")?, None);
        assert_eq!(backup.last_modified("data", "missing")?, None);
        Ok(())
    }

    #[test]
    fn test_delete_reports_existence() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let backup = LocalBackup::new(temp_dir.path());

        backup.save("data", "k", b"blob")?;
        assert!(backup.delete("data", "k")?);
        assert!(!backup.delete("data", "k")?);
        assert_eq!(backup.load("data", "k")?, None);
        Ok(())
    }

    #[test]
    fn test_list_only_backup_files() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let backup = LocalBackup::new(temp_dir.path());

        backup.save("players", "bob", b"1")?;
        backup.save("players", "alice", b"2")?;
        std::fs::write(temp_dir.path().join("players").join("stray.txt"), b"x").unwrap();

        assert_eq!(backup.list("players")?, vec!["alice", "bob"]);
        Ok(())
    }

    #[test]
    fn test_list_missing_namespace_is_empty() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let backup = LocalBackup::new(temp_dir.path());

        assert!(backup.list("nothing")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_last_modified_present() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let backup = LocalBackup::new(temp_dir.path());

        backup.save("data", "k", b"blob")?;
        let mtime = backup.last_modified("data", "k")?.unwrap();
        assert!(mtime <= Utc::now());
        Ok(())
    }
}
