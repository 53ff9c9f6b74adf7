//! Last-known remote digests, persisted for offline diagnostics.
//!
//! After a successful write the executor records the remote content digest
//! here, one `path<TAB>digest` line per entry. The cache lives next to the
//! pin store, is read by `doctor` only, and is never authoritative for
//! planning — fresh inspection always wins.

use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Persisted map from local path to last-known remote digest.
#[derive(Debug)]
pub struct HashCache {
    file: PathBuf,
    digests: BTreeMap<PathBuf, String>,
}

impl HashCache {
    /// Load the cache from `file`. A missing file is an empty cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(file: &Path) -> Result<Self> {
        let mut digests = BTreeMap::new();
        if file.exists() {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("reading hash cache {}", file.display()))?;
            for line in content.lines() {
                if let Some((path, digest)) = line.split_once('\t') {
                    digests.insert(PathBuf::from(path), digest.trim().to_string());
                }
            }
        }
        Ok(Self {
            file: file.to_path_buf(),
            digests,
        })
    }

    /// Last-known remote digest for `path`, if any.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.digests.get(path).map(String::as_str)
    }

    /// Number of recorded digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Record `digest` for `path` and persist synchronously.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cache cannot be written.
    pub fn record(&mut self, path: &Path, digest: &str) -> Result<()> {
        self.digests.insert(path.to_path_buf(), digest.to_string());
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut content = String::new();
        for (path, digest) in &self.digests {
            content.push_str(&path.to_string_lossy());
            content.push('\t');
            content.push_str(digest);
            content.push('\n');
        }
        std::fs::write(&self.file, content)
            .with_context(|| format!("writing hash cache {}", self.file.display()))
    }
}
