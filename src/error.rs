//! Domain-specific error types for the reconciliation engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`DeclarationError`],
//! [`FetchError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! OmzminiError
//! ├── Declaration(DeclarationError) — .zshrc missing or unparseable
//! ├── Catalog(CatalogError)         — unknown items, duplicate targets
//! ├── Fetch(FetchError)             — remote content retrieval failures
//! ├── Apply(ApplyError)             — write and post-write verification
//! └── Upgrade(UpgradeError)         — self-upgrade state machine failures
//! ```
//!
//! Only declaration-level failures abort a run. Catalog, fetch, and apply
//! errors are per-item: they are collected and surfaced in the run summary
//! while the remaining items continue.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the reconciliation engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum OmzminiError {
    /// Shell configuration declaration problem (missing or malformed).
    #[error("Declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    /// Catalog resolution problem (unknown item, duplicate target path).
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Remote content retrieval failure.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Local write or post-write verification failure.
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    /// Self-upgrade failure.
    #[error("Upgrade error: {0}")]
    Upgrade(#[from] UpgradeError),
}

/// Errors raised while reading the desired-state declaration from `.zshrc`.
///
/// These are the only errors fatal to a whole run: without a declaration
/// there is no desired state to reconcile against.
#[derive(Error, Debug)]
pub enum DeclarationError {
    /// The shell configuration file does not exist.
    #[error("shell configuration not found at {}", path.display())]
    Missing {
        /// Path that was probed for the declaration.
        path: PathBuf,
    },

    /// The file exists but contains no recognizable plugin or theme markers.
    #[error("no plugins=( ... ) or ZSH_THEME= declaration found in {}", path.display())]
    Malformed {
        /// Path of the file that was scanned.
        path: PathBuf,
    },

    /// An I/O error occurred while reading the declaration file.
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised while resolving desired items against the catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A declared plugin or theme has no catalog mapping.
    ///
    /// Reported per item; other items still resolve.
    #[error("unknown {kind} '{name}': not in the catalog")]
    UnknownItem {
        /// Item kind as a lowercase word (`"plugin"` or `"theme"`).
        kind: &'static str,
        /// Declared item name.
        name: String,
    },

    /// Two desired items resolved to the same local path.
    ///
    /// This is a configuration error, never silently resolved.
    #[error("duplicate local target {}", path.display())]
    DuplicateTarget {
        /// The local path claimed more than once.
        path: PathBuf,
    },
}

/// Errors raised while fetching remote content.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The remote location could not be retrieved (network error, timeout,
    /// or non-success HTTP status).
    #[error("failed to fetch {url}: {reason}")]
    Failed {
        /// Remote location that could not be retrieved.
        url: String,
        /// Human-readable reason from the transport.
        reason: String,
    },
}

/// Errors raised while applying a plan action to the local tree.
#[derive(Error, Debug)]
pub enum ApplyError {
    /// The content written to disk does not hash to the fetched content's
    /// digest (truncated or interfered-with write).
    #[error("integrity mismatch at {}: expected {expected}, got {actual}", path.display())]
    IntegrityMismatch {
        /// Local path whose post-write digest disagreed.
        path: PathBuf,
        /// Digest of the fetched content.
        expected: String,
        /// Digest of what ended up on disk.
        actual: String,
    },

    /// An I/O error occurred while staging or renaming the file.
    #[error("IO error writing {}: {source}", path.display())]
    Io {
        /// Local path being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors terminating the self-upgrade state machine.
///
/// Each variant names the state in which the upgrade failed; in every case
/// the original artifact is left untouched.
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// The candidate artifact could not be fetched. No local state changed.
    #[error("upgrade fetch failed: {0}")]
    FetchFailed(String),

    /// The timestamped backup copy could not be created. No destructive
    /// write was attempted.
    #[error("backup to {} failed: {reason}", backup.display())]
    BackupFailed {
        /// Intended backup path.
        backup: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// The atomic rename of the candidate over the artifact failed. The
    /// backup and the original artifact are both intact.
    #[error("replacing {} failed: {reason}", artifact.display())]
    ReplaceFailed {
        /// Artifact path that was being replaced.
        artifact: PathBuf,
        /// Human-readable reason.
        reason: String,
    },
}
