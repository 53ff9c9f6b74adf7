//! Shared per-invocation state: resolved paths, persistent stores, and the
//! remote fetch stack.
//!
//! A [`Context`] is built once per command from the CLI flags and the
//! environment, then threaded through the command handlers. Nothing here
//! fetches; the context only wires the pieces together.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::audit::AuditLog;
use crate::fetch::{Fetcher, HttpFetcher, RemoteCache};
use crate::hashcache::HashCache;
use crate::pins::PinStore;

/// Resolved filesystem locations for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Managed tree root (default `~/.oh-my-zsh`).
    pub root: PathBuf,
    /// User declaration file (default `~/.zshrc`).
    pub zshrc: PathBuf,
    /// Configuration directory (default `~/.config/omzmini`).
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve paths from optional CLI overrides and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a default is needed and `HOME` (or `USERPROFILE`
    /// on Windows) is not set.
    pub fn resolve(root: Option<PathBuf>, zshrc: Option<PathBuf>) -> Result<Self> {
        let home = home_dir()?;
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join("omzmini");
        Ok(Self {
            root: root.unwrap_or_else(|| home.join(".oh-my-zsh")),
            zshrc: zshrc.unwrap_or_else(|| home.join(".zshrc")),
            config_dir,
        })
    }

    /// Pin store file (`pinned.txt` in the config directory).
    #[must_use]
    pub fn pin_file(&self) -> PathBuf {
        self.config_dir.join("pinned.txt")
    }

    /// Last-known remote digest cache file.
    #[must_use]
    pub fn hash_file(&self) -> PathBuf {
        self.config_dir.join("hashes.txt")
    }

    /// Audit log file (`log/audit.jsonl` under the managed root, so the log
    /// travels with the tree it describes).
    #[must_use]
    pub fn audit_file(&self) -> PathBuf {
        self.root.join("log").join("audit.jsonl")
    }
}

/// Everything a command handler needs for one run.
pub struct Context {
    /// Resolved filesystem locations.
    pub paths: Paths,
    /// Base URL for remote canonical content.
    pub remote_base: String,
    /// Pinned local paths, loaded once.
    pub pins: PinStore,
    /// Append-only action log.
    pub audit: AuditLog,
    /// Last-known remote digests.
    pub hashes: HashCache,
    /// Remote content retriever.
    pub fetcher: Box<dyn Fetcher>,
    /// Per-run fetch memoisation (at most one fetch per remote location).
    pub cache: RemoteCache,
    /// Preview mode: describe actions without performing them.
    pub dry_run: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("paths", &self.paths)
            .field("remote_base", &self.remote_base)
            .field("pins", &self.pins)
            .field("audit", &self.audit)
            .field("hashes", &self.hashes)
            .field("fetcher", &"<dyn Fetcher>")
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build the context for one invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin store or hash cache exists but cannot be
    /// read.
    pub fn new(
        paths: Paths,
        remote_base: String,
        fetcher: Box<dyn Fetcher>,
        audit_enabled: bool,
        dry_run: bool,
    ) -> Result<Self> {
        let pins = PinStore::load(&paths.pin_file())
            .with_context(|| format!("loading pin store {}", paths.pin_file().display()))?;
        let hashes = HashCache::load(&paths.hash_file())
            .with_context(|| format!("loading hash cache {}", paths.hash_file().display()))?;
        let audit = AuditLog::new(&paths.audit_file(), audit_enabled);
        Ok(Self {
            paths,
            remote_base,
            pins,
            audit,
            hashes,
            fetcher,
            cache: RemoteCache::new(),
            dry_run,
        })
    }

    /// Default context with the real HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Propagates path resolution and store loading failures.
    pub fn from_env(
        root: Option<PathBuf>,
        zshrc: Option<PathBuf>,
        remote_base: Option<String>,
        audit_enabled: bool,
        dry_run: bool,
    ) -> Result<Self> {
        let paths = Paths::resolve(root, zshrc)?;
        let base =
            remote_base.unwrap_or_else(|| crate::catalog::DEFAULT_REMOTE_BASE.to_string());
        Self::new(paths, base, Box::new(HttpFetcher::new()), audit_enabled, dry_run)
    }
}

/// The user's home directory from the environment.
fn home_dir() -> Result<PathBuf> {
    let home = if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE")
            .or_else(|_| std::env::var("HOME"))
            .map_err(|_| {
                anyhow::anyhow!("neither USERPROFILE nor HOME environment variable is set")
            })?
    } else {
        std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?
    };
    Ok(PathBuf::from(home))
}
