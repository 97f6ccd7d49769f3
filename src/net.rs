//! Connectivity probe.
//!
//! The online/offline branch in the store is gated by a boundary check that
//! is injected as a trait, so tests can simulate either state without
//! touching the real network. The probe is consulted once per logical
//! operation and never cached: a probe success is a precondition check, not
//! a guarantee, and remote calls that fail afterwards still degrade to the
//! local path.

use std::time::Duration;

/// One-method collaborator deciding whether the remote store is reachable.
pub trait Connectivity {
    fn is_online(&self) -> bool;
}

/// Probe that issues a HEAD request against a well-known host.
pub struct HttpProbe {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpProbe {
    /// Probe against `https://api.github.com`.
    pub fn new() -> Self {
        Self::with_url("https://api.github.com")
    }

    /// Probe against a custom URL. Uses a short fixed timeout so an
    /// unreachable network answers "offline" quickly instead of hanging.
    pub fn with_url(url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("gitkv")
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity for HttpProbe {
    fn is_online(&self) -> bool {
        match self.client.head(&self.url).send() {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("[net] Connectivity probe failed: {}", e);
                false
            }
        }
    }
}
