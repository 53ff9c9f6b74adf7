//! User-asserted exclusions ("pins") preventing local paths from being
//! modified by reconciliation.
//!
//! Persisted as a newline-delimited path set. Every mutation is written
//! through synchronously (no write-behind) so a crash never loses a pin.

use anyhow::{Context as _, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Persisted set of pinned local paths.
///
/// Pinning is absolute exclusion: a pinned path is never fetched, restored,
/// or overwritten, regardless of its content.
#[derive(Debug)]
pub struct PinStore {
    file: PathBuf,
    paths: BTreeSet<PathBuf>,
}

impl PinStore {
    /// Load the pin set from `file`.
    ///
    /// A missing file is an empty set, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(file: &Path) -> Result<Self> {
        let paths = if file.exists() {
            std::fs::read_to_string(file)
                .with_context(|| format!("reading pin store {}", file.display()))?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(PathBuf::from)
                .collect()
        } else {
            BTreeSet::new()
        };
        Ok(Self {
            file: file.to_path_buf(),
            paths,
        })
    }

    /// Whether `path` is pinned.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Number of pinned paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate over pinned paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    /// Pin `path`. Returns `true` if it was newly added. Persists
    /// synchronously on change.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated set cannot be written.
    pub fn add(&mut self, path: &Path) -> Result<bool> {
        let added = self.paths.insert(path.to_path_buf());
        if added {
            self.persist()?;
        }
        Ok(added)
    }

    /// Unpin `path`. Returns `true` if it was present. Persists
    /// synchronously on change.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated set cannot be written.
    pub fn remove(&mut self, path: &Path) -> Result<bool> {
        let removed = self.paths.remove(path);
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut content = String::new();
        for path in &self.paths {
            content.push_str(&path.to_string_lossy());
            content.push('\n');
        }
        std::fs::write(&self.file, content)
            .with_context(|| format!("writing pin store {}", self.file.display()))
    }
}
