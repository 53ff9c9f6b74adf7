//! State inspection: what does the local tree actually look like?
//!
//! For every resolved [`CatalogEntry`] the inspector produces a
//! [`FileState`] computed fresh on each invocation. Remote digests are
//! fetched lazily through the shared [`RemoteCache`], at most once per
//! distinct remote location per run. The inspector performs no writes.

use std::path::Path;

use crate::catalog::CatalogEntry;
use crate::digest::sha256_bytes;
use crate::fetch::{Fetcher, RemoteCache};
use crate::pins::PinStore;

/// Inspected status of one local path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The local path does not exist.
    Absent,
    /// Present and matching the remote canonical content (or present and
    /// unverifiable because the remote digest is unavailable).
    Current,
    /// Present with a digest differing from the remote canonical content.
    Outdated,
    /// Present but unreadable or zero-length. Overrides any cached
    /// judgment of currency.
    Corrupted,
    /// Present and explicitly excluded by a pin, regardless of content.
    PinnedSkip,
}

impl Status {
    /// Lowercase word for display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Current => "current",
            Self::Outdated => "outdated",
            Self::Corrupted => "corrupted",
            Self::PinnedSkip => "pinned",
        }
    }
}

/// Actual state of one catalog entry's local path.
///
/// Computed fresh every invocation; never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    /// The catalog entry this state was inspected for.
    pub entry: CatalogEntry,
    /// Inspected status.
    pub status: Status,
    /// SHA-256 of the local content, when readable and non-empty.
    pub local_hash: Option<String>,
    /// SHA-256 of the remote canonical content, when it was reachable.
    pub remote_hash: Option<String>,
}

impl FileState {
    /// Local path shorthand.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.entry.local_path
    }
}

/// Inspect every entry against the local tree and the pin set.
///
/// Side effects: local file reads and at most one remote read per distinct
/// remote location (deduplicated by `cache`). Absent paths are not fetched.
#[must_use]
pub fn inspect(
    entries: &[CatalogEntry],
    pins: &PinStore,
    fetcher: &dyn Fetcher,
    cache: &mut RemoteCache,
) -> Vec<FileState> {
    entries
        .iter()
        .map(|entry| inspect_one(entry, pins, fetcher, cache))
        .collect()
}

fn inspect_one(
    entry: &CatalogEntry,
    pins: &PinStore,
    fetcher: &dyn Fetcher,
    cache: &mut RemoteCache,
) -> FileState {
    let path = &entry.local_path;

    if !path.exists() {
        return FileState {
            entry: entry.clone(),
            status: Status::Absent,
            local_hash: None,
            remote_hash: None,
        };
    }

    // Pinning is absolute: content is not even read.
    if pins.contains(path) {
        return FileState {
            entry: entry.clone(),
            status: Status::PinnedSkip,
            local_hash: None,
            remote_hash: None,
        };
    }

    let local = match std::fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) | Err(_) => {
            tracing::debug!("unreadable or empty file at {}", path.display());
            return FileState {
                entry: entry.clone(),
                status: Status::Corrupted,
                local_hash: None,
                remote_hash: None,
            };
        }
    };
    let local_hash = sha256_bytes(&local);

    let remote_hash = match cache.get(fetcher, &entry.remote_location) {
        Ok(bytes) => Some(sha256_bytes(bytes)),
        Err(e) => {
            tracing::debug!("remote digest unavailable: {e}");
            None
        }
    };

    let status = match &remote_hash {
        Some(remote) if *remote != local_hash => Status::Outdated,
        // No remote digest means the file is unverifiable; treat as current.
        _ => Status::Current,
    };

    FileState {
        entry: entry.clone(),
        status,
        local_hash: Some(local_hash),
        remote_hash,
    }
}
