//! Append-only audit log: one structured record per action taken.
//!
//! The sink is process-wide and optional (enabled by default). Records are
//! serialized as one JSON line each; the file is opened lazily on the first
//! write, flushed per record, and never held open across invocations.
//! Logging is a pure side-channel — it never influences control flow, and a
//! failed append only emits a tracing warning.

use serde::Serialize;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Action verb recorded per plan action (plus the self-upgrade terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verb {
    /// Fetch remote content and write it into place.
    Fetch,
    /// Same write path as `Fetch`, produced by restore-mode plans for
    /// entries that were absent.
    Restore,
    /// Entry excluded by an explicit pin.
    SkipPinned,
    /// Entry already matches the remote canonical content.
    SkipCurrent,
    /// Self-upgrade of the running artifact.
    Upgrade,
}

impl Verb {
    /// Lowercase kebab-case form used in descriptions and audit lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Restore => "restore",
            Self::SkipPinned => "skip-pinned",
            Self::SkipCurrent => "skip-current",
            Self::Upgrade => "upgrade",
        }
    }
}

/// Outcome of an executed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The action completed (including no-op skips).
    Success,
    /// The action failed; `detail` carries the reason.
    Failed,
}

/// One append-only audit record. Ordering in the log equals invocation
/// order; records are never rewritten or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// UTC timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// What was done (or attempted).
    pub verb: Verb,
    /// Local path the action targeted.
    pub path: PathBuf,
    /// Whether the action succeeded.
    pub outcome: Outcome,
    /// Human-readable detail (digest, skip reason, or failure cause).
    pub detail: String,
}

impl AuditRecord {
    /// Build a record stamped with the current UTC time.
    #[must_use]
    pub fn now(verb: Verb, path: &Path, outcome: Outcome, detail: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            verb,
            path: path.to_path_buf(),
            outcome,
            detail: detail.to_string(),
        }
    }
}

/// Lazily-opened append-only sink for [`AuditRecord`]s.
#[derive(Debug)]
pub struct AuditLog {
    file: PathBuf,
    enabled: bool,
}

impl AuditLog {
    /// Create a sink writing to `file`. The file is not touched until the
    /// first append.
    #[must_use]
    pub fn new(file: &Path, enabled: bool) -> Self {
        Self {
            file: file.to_path_buf(),
            enabled,
        }
    }

    /// Whether appends are currently written through.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle the sink for the rest of the invocation.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Path of the underlying log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Append one record as a JSON line, creating the file (and its parent
    /// directory) on first use and flushing before returning.
    ///
    /// Errors are reported via `tracing::warn!` and otherwise swallowed:
    /// audit output must never change engine behavior.
    pub fn append(&self, record: &AuditRecord) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.try_append(record) {
            tracing::warn!("audit log append failed: {e}");
        }
    }

    fn try_append(&self, record: &AuditRecord) -> std::io::Result<()> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)?;
        writeln!(file, "{line}")?;
        file.flush()
    }
}
