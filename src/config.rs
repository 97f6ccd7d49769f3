//! Configuration (gitkv.toml).
//!
//! Holds the GitHub repository coordinates, the local backup directory and
//! the HTTP settings. Everything has a serde default so a partial file (or
//! no file at all) still yields a usable config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// GitHub repository used as the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository owner (user or org).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch to read and write. Defaults to "main".
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Personal access token with contents read/write scope.
    pub token: String,
}

fn default_branch() -> String {
    "main".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            token: String::new(),
        }
    }
}

/// Local backup directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Root directory for encrypted backups. One subdirectory per namespace.
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("gitkv")
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds. None means no application-level timeout
    /// beyond the transport's own default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// URL the connectivity probe checks before each online operation.
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
}

fn default_probe_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            probe_url: default_probe_url(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Save config as pretty TOML, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Default config file location: `~/.config/gitkv/gitkv.toml`, falling
    /// back to the current directory when no config dir is available.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gitkv")
            .join("gitkv.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::load(&temp_dir.path().join("nope.toml"))?;

        assert_eq!(config.github.branch, "main");
        assert_eq!(config.backup.dir, PathBuf::from("gitkv"));
        assert!(config.http.timeout_secs.is_none());
        Ok(())
    }

    #[test]
    fn test_constructed_default_matches_serde_defaults() {
        // Default::default() must agree with the serde defaults, or a
        // config built in code talks to the API with an empty branch.
        let config = Config::default();

        assert_eq!(config.github.branch, "main");
        assert_eq!(config.backup.dir, PathBuf::from("gitkv"));
        assert_eq!(config.http.probe_url, "https://api.github.com");
    }

    #[test]
    fn test_save_load_roundtrip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("gitkv.toml");

        let mut config = Config::default();
        config.github.owner = "octocat".to_string();
        config.github.repo = "game-saves".to_string();
        config.github.token = "ghp_test".to_string();
        config.http.timeout_secs = Some(10);
        config.save(&path)?;

        let loaded = Config::load(&path)?;
        assert_eq!(loaded.github.owner, "octocat");
        assert_eq!(loaded.github.repo, "game-saves");
        assert_eq!(loaded.http.timeout_secs, Some(10));
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("gitkv.toml");
        std::fs::write(
            &path,
            "[github]\nowner = \"octocat\"\nrepo = \"r\"\ntoken = \"t\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.github.branch, "main");
        assert_eq!(config.http.probe_url, "https://api.github.com");
        Ok(())
    }
}
