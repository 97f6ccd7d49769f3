//! Remote store client - files in a GitHub repository.
//!
//! The remote side of the store is a plain file API: one HTTP round trip
//! per call, no retries, no batching. `Remote` is the seam the
//! reconciliation core talks through, so tests can swap in an in-memory
//! fake; `GitHubRemote` is the production implementation against
//! `/repos/{owner}/{repo}/contents/{path}`.

use crate::config::{GitHubConfig, HttpConfig};
use crate::error::{Result, StoreError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = "gitkv";

/// A remote file: decoded content plus the content hash the host assigned,
/// which the next overwrite must present (compare-and-swap style).
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: Vec<u8>,
    pub sha: String,
}

/// Outcome of a remote delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDeleteStatus {
    /// The file existed and was removed.
    Deleted,
    /// No file at that path.
    NotFound,
}

/// File-storage API the store runs against. Every call is one network
/// round trip; any failure means "operation did not complete" and callers
/// fall back to the local backup.
pub trait Remote {
    /// Fetch a file's decoded content and content hash. `None` on 404.
    fn get(&self, path: &str) -> Result<Option<RemoteFile>>;

    /// Create the file if absent, or overwrite it using the last-known
    /// content hash.
    fn put(&self, path: &str, content: &[u8], message: &str) -> Result<()>;

    /// Delete the file.
    fn delete(&self, path: &str, message: &str) -> Result<RemoteDeleteStatus>;

    /// Timestamp of the last change to the file. `None` when the file does
    /// not exist or has no history.
    fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>>;

    /// Names of the files directly under a directory. Empty on 404.
    fn list(&self, dir: &str) -> Result<Vec<String>>;
}

/// GitHub contents API client (blocking).
pub struct GitHubRemote {
    client: reqwest::blocking::Client,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

impl GitHubRemote {
    /// Build a client from config. `timeout_secs = None` keeps the
    /// transport's own default; no extra application-level timeout.
    pub fn new(github: &GitHubConfig, http: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            owner: github.owner.clone(),
            repo: github.repo.clone(),
            branch: github.branch.clone(),
            token: github.token.clone(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            GITHUB_API, self.owner, self.repo, path
        )
    }

    fn commits_url(&self) -> String {
        format!("{}/repos/{}/{}/commits", GITHUB_API, self.owner, self.repo)
    }

    fn request(&self, builder: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
    }

    /// The API returns base64 with embedded newlines; strip whitespace
    /// before decoding.
    fn decode_content(encoded: &str) -> Result<Vec<u8>> {
        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        BASE64
            .decode(cleaned)
            .map_err(|e| StoreError::Decode(format!("invalid base64 from host API: {}", e)))
    }
}

impl Remote for GitHubRemote {
    fn get(&self, path: &str) -> Result<Option<RemoteFile>> {
        let url = self.contents_url(path);
        let response = self
            .request(self.client.get(&url))
            .query(&[("ref", self.branch.as_str())])
            .send()?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let file: Value = response.json()?;
                let sha = file
                    .get("sha")
                    .and_then(|s| s.as_str())
                    .ok_or_else(|| StoreError::Decode("missing sha in file response".to_string()))?
                    .to_string();
                let encoded = file
                    .get("content")
                    .and_then(|c| c.as_str())
                    .ok_or_else(|| StoreError::Decode("missing content in file response".to_string()))?;
                let content = Self::decode_content(encoded)?;
                Ok(Some(RemoteFile { content, sha }))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(StoreError::status(status, path)),
        }
    }

    fn put(&self, path: &str, content: &[u8], message: &str) -> Result<()> {
        // The contents API requires the current sha to overwrite.
        let sha = self.get(path)?.map(|f| f.sha);

        let mut payload = serde_json::json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": self.branch,
        });
        if let Some(sha) = sha {
            payload["sha"] = Value::String(sha);
        }

        let url = self.contents_url(path);
        let response = self.request(self.client.put(&url)).json(&payload).send()?;

        match response.status() {
            reqwest::StatusCode::OK | reqwest::StatusCode::CREATED => {
                tracing::debug!("[remote] Wrote {}", path);
                Ok(())
            }
            status => Err(StoreError::status(status, path)),
        }
    }

    fn delete(&self, path: &str, message: &str) -> Result<RemoteDeleteStatus> {
        let sha = match self.get(path)? {
            Some(file) => file.sha,
            None => return Ok(RemoteDeleteStatus::NotFound),
        };

        let payload = serde_json::json!({
            "message": message,
            "sha": sha,
            "branch": self.branch,
        });

        let url = self.contents_url(path);
        let response = self
            .request(self.client.delete(&url))
            .json(&payload)
            .send()?;

        match response.status() {
            reqwest::StatusCode::OK | reqwest::StatusCode::NO_CONTENT => {
                tracing::debug!("[remote] Deleted {}", path);
                Ok(RemoteDeleteStatus::Deleted)
            }
            reqwest::StatusCode::NOT_FOUND => Ok(RemoteDeleteStatus::NotFound),
            status => Err(StoreError::status(status, path)),
        }
    }

    fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>> {
        let response = self
            .request(self.client.get(self.commits_url()))
            .query(&[
                ("path", path),
                ("sha", self.branch.as_str()),
                ("per_page", "1"),
            ])
            .send()?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let commits: Vec<Value> = response.json()?;
                let date = commits
                    .first()
                    .and_then(|c| c.pointer("/commit/committer/date"))
                    .and_then(|d| d.as_str());
                match date {
                    Some(date) => {
                        let parsed = DateTime::parse_from_rfc3339(date).map_err(|e| {
                            StoreError::Decode(format!("bad commit timestamp `{}`: {}", date, e))
                        })?;
                        Ok(Some(parsed.with_timezone(&Utc)))
                    }
                    None => Ok(None),
                }
            }
            // 404: no such path; 409: empty repository without commits.
            reqwest::StatusCode::NOT_FOUND | reqwest::StatusCode::CONFLICT => Ok(None),
            status => Err(StoreError::status(status, path)),
        }
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let url = self.contents_url(dir);
        let response = self
            .request(self.client.get(&url))
            .query(&[("ref", self.branch.as_str())])
            .send()?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let entries: Vec<Value> = response.json()?;
                let names = entries
                    .iter()
                    .filter(|e| e.get("type").and_then(|t| t.as_str()) == Some("file"))
                    .filter_map(|e| e.get("name").and_then(|n| n.as_str()))
                    .map(|n| n.to_string())
                    .collect();
                Ok(names)
            }
            reqwest::StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => Err(StoreError::status(status, dir)),
        }
    }
}
