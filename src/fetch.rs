//! Remote content retrieval behind an injectable trait seam.
//!
//! Provides the [`Fetcher`] trait so the engine can be unit-tested without
//! network access. Production code uses [`HttpFetcher`] (a [`ureq`] agent
//! with bounded timeouts); tests implement [`Fetcher`] over an in-memory
//! map. [`RemoteCache`] guarantees at most one fetch per distinct remote
//! location per invocation.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::FetchError;

/// TCP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total per-request timeout. A fetch never hangs past this bound; it fails
/// with [`FetchError::Failed`] instead.
const GLOBAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on a single fetched body (largest catalog entries are shell
/// scripts well under this).
const MAX_BODY_SIZE: u64 = 8 * 1024 * 1024;

/// Abstraction over raw content retrieval (URI in, bytes out).
///
/// No authentication, pagination, or streaming: each catalog entry is a
/// single small file.
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    /// Retrieve the raw bytes at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Failed`] on any transport error, non-success
    /// status, or timeout.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Production [`Fetcher`] backed by a [`ureq::Agent`].
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with the engine's standard timeouts.
    #[must_use]
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .timeout_global(Some(GLOBAL_TIMEOUT))
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", concat!("omzmini/", env!("CARGO_PKG_VERSION")))
            .call()
            .map_err(|e| FetchError::Failed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_vec()
            .map_err(|e| FetchError::Failed {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Per-invocation fetch cache keyed by remote location.
///
/// Both successes and failures are cached, so a remote location is contacted
/// at most once per run regardless of how many components ask for it.
#[derive(Debug, Default)]
pub struct RemoteCache {
    entries: HashMap<String, Result<Vec<u8>, String>>,
}

impl RemoteCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the content at `url`, fetching through `fetcher` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Failed`] if the (possibly cached) fetch failed.
    pub fn get(&mut self, fetcher: &dyn Fetcher, url: &str) -> Result<&[u8], FetchError> {
        if !self.entries.contains_key(url) {
            let result = fetcher.fetch(url).map_err(|e| e.to_string());
            self.entries.insert(url.to_string(), result);
        }
        match self.entries.get(url) {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(reason)) => Err(FetchError::Failed {
                url: url.to_string(),
                reason: reason.clone(),
            }),
            // Unreachable: the entry was inserted above.
            None => Err(FetchError::Failed {
                url: url.to_string(),
                reason: "cache miss".to_string(),
            }),
        }
    }

    /// Number of distinct remote locations contacted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no remote location has been contacted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
