//! Verified self-replacement of the running artifact.
//!
//! A single-target state machine, independent of the planner/executor:
//! `Idle → Fetching → Verifying → BackingUp → Replacing → Done`, with
//! `Failed` reachable from any non-idle state. Ordering is load-bearing:
//! the timestamped backup is created strictly before any destructive write,
//! and the replacement is a write-to-temp-then-atomic-rename, which is safe
//! while the program is still executing because the OS keeps the running
//! image open under its original inode. Rollback is an explicit external
//! action (copy the backup over the artifact); the engine never
//! auto-rolls-back.

use std::path::{Path, PathBuf};

use crate::audit::{AuditLog, AuditRecord, Outcome, Verb};
use crate::digest::{sha256_bytes, sha256_file};
use crate::error::UpgradeError;
use crate::fetch::Fetcher;

/// States of the self-upgrade machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeState {
    /// Not started.
    Idle,
    /// Retrieving the candidate artifact.
    Fetching,
    /// Comparing candidate and current digests.
    Verifying,
    /// Copying the current artifact aside.
    BackingUp,
    /// Atomically renaming the candidate into place.
    Replacing,
    /// Terminal success (including the already-up-to-date short-circuit).
    Done,
    /// Terminal failure; the original artifact is untouched.
    Failed,
}

/// Terminal report of a self-upgrade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Terminal state (always [`UpgradeState::Done`] on the `Ok` path).
    pub state: UpgradeState,
    /// Backup path to use for an explicit rollback, when one was created.
    pub rollback_path: Option<PathBuf>,
    /// Human-readable summary.
    pub detail: String,
}

/// Run the self-upgrade state machine for `artifact` against `url`.
///
/// Upgrade is idempotent: when the candidate's digest equals the current
/// artifact's digest the machine short-circuits to `Done` without creating
/// a backup or writing anything.
///
/// With `dry_run` set, the machine stops after verification and reports
/// what it would do; no backup, write, or audit append happens.
///
/// # Errors
///
/// - [`UpgradeError::FetchFailed`] — network failure, no local state changed.
/// - [`UpgradeError::BackupFailed`] — backup copy failed, nothing replaced.
/// - [`UpgradeError::ReplaceFailed`] — rename failed, backup and original
///   both intact.
pub fn run(
    artifact: &Path,
    url: &str,
    fetcher: &dyn Fetcher,
    audit: &AuditLog,
    dry_run: bool,
) -> Result<UpgradeReport, UpgradeError> {
    let report = drive(artifact, url, fetcher, dry_run);
    if !dry_run {
        let record = match &report {
            Ok(r) => AuditRecord::now(Verb::Upgrade, artifact, Outcome::Success, &r.detail),
            Err(e) => AuditRecord::now(Verb::Upgrade, artifact, Outcome::Failed, &e.to_string()),
        };
        audit.append(&record);
    }
    report
}

fn drive(
    artifact: &Path,
    url: &str,
    fetcher: &dyn Fetcher,
    dry_run: bool,
) -> Result<UpgradeReport, UpgradeError> {
    tracing::debug!("upgrade: {:?} -> {:?}", UpgradeState::Idle, UpgradeState::Fetching);
    let candidate = fetcher
        .fetch(url)
        .map_err(|e| UpgradeError::FetchFailed(e.to_string()))?;

    tracing::debug!("upgrade: {:?}", UpgradeState::Verifying);
    let candidate_digest = sha256_bytes(&candidate);
    let current_digest = sha256_file(artifact).ok();
    if current_digest.as_deref() == Some(candidate_digest.as_str()) {
        tracing::info!("already up to date ({candidate_digest})");
        return Ok(UpgradeReport {
            state: UpgradeState::Done,
            rollback_path: None,
            detail: "already up to date".to_string(),
        });
    }

    let backup = backup_path(artifact, &chrono::Utc::now().format("%Y%m%d%H%M%S").to_string());

    if dry_run {
        return Ok(UpgradeReport {
            state: UpgradeState::Done,
            rollback_path: None,
            detail: format!("would back up to {} and replace", backup.display()),
        });
    }

    tracing::debug!("upgrade: {:?}", UpgradeState::BackingUp);
    std::fs::copy(artifact, &backup).map_err(|e| UpgradeError::BackupFailed {
        backup: backup.clone(),
        reason: e.to_string(),
    })?;

    tracing::debug!("upgrade: {:?}", UpgradeState::Replacing);
    replace(artifact, &candidate).inspect_err(|_| {
        // Backup stays for the user; the original artifact is untouched
        // because the rename is all-or-nothing.
        tracing::warn!("replace failed; backup kept at {}", backup.display());
    })?;

    tracing::info!(
        "upgraded {} (rollback: {})",
        artifact.display(),
        backup.display()
    );
    Ok(UpgradeReport {
        state: UpgradeState::Done,
        rollback_path: Some(backup.clone()),
        detail: format!("replaced; rollback at {}", backup.display()),
    })
}

/// Stage the candidate next to the artifact and rename it into place.
fn replace(artifact: &Path, candidate: &[u8]) -> Result<(), UpgradeError> {
    let failed = |reason: String| UpgradeError::ReplaceFailed {
        artifact: artifact.to_path_buf(),
        reason,
    };

    let staging = staging_path(artifact);
    std::fs::write(&staging, candidate).map_err(|e| failed(e.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| failed(e.to_string()))?;
    }

    if let Err(e) = std::fs::rename(&staging, artifact) {
        let _ = std::fs::remove_file(&staging);
        return Err(failed(e.to_string()));
    }
    Ok(())
}

/// Backup path: the artifact's own name plus `.bak.<timestamp>`.
fn backup_path(artifact: &Path, timestamp: &str) -> PathBuf {
    let mut p = artifact.to_path_buf();
    let name = artifact.file_name().map_or_else(
        || std::ffi::OsString::from(format!(".bak.{timestamp}")),
        |n| {
            let mut s = n.to_os_string();
            s.push(format!(".bak.{timestamp}"));
            s
        },
    );
    p.set_file_name(name);
    p
}

/// Staging path for the candidate (same directory, `.new` suffix).
fn staging_path(artifact: &Path) -> PathBuf {
    let mut p = artifact.to_path_buf();
    let name = artifact.file_name().map_or_else(
        || std::ffi::OsString::from(".new"),
        |n| {
            let mut s = n.to_os_string();
            s.push(".new");
            s
        },
    );
    p.set_file_name(name);
    p
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::fetch::test_helpers::MockFetcher;

    const URL: &str = "https://remote.test/releases/omzmini";

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(current: &[u8]) -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            std::fs::write(dir.path().join("omzmini"), current).expect("seed artifact");
            Self { dir }
        }

        fn artifact(&self) -> PathBuf {
            self.dir.path().join("omzmini")
        }

        fn audit(&self) -> AuditLog {
            AuditLog::new(&self.dir.path().join("audit.log"), true)
        }

        fn backups(&self) -> Vec<PathBuf> {
            std::fs::read_dir(self.dir.path())
                .expect("read_dir")
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.to_string_lossy().contains(".bak."))
                .collect()
        }
    }

    #[test]
    fn identical_artifact_short_circuits_without_backup() {
        let fx = Fixture::new(b"binary v1");
        let fetcher = MockFetcher::new().with(URL, b"binary v1");
        let report =
            run(&fx.artifact(), URL, &fetcher, &fx.audit(), false).expect("already current");
        assert_eq!(report.state, UpgradeState::Done);
        assert_eq!(report.rollback_path, None);
        assert_eq!(report.detail, "already up to date");
        assert!(fx.backups().is_empty(), "no backup for an idempotent no-op");
    }

    #[test]
    fn upgrade_replaces_artifact_and_reports_rollback() {
        let fx = Fixture::new(b"binary v1");
        let fetcher = MockFetcher::new().with(URL, b"binary v2");
        let report = run(&fx.artifact(), URL, &fetcher, &fx.audit(), false).expect("upgrade");
        assert_eq!(report.state, UpgradeState::Done);
        assert_eq!(
            std::fs::read(fx.artifact()).expect("read artifact"),
            b"binary v2"
        );
        let rollback = report.rollback_path.expect("rollback path");
        assert_eq!(
            std::fs::read(&rollback).expect("read backup"),
            b"binary v1",
            "backup must hold the pre-upgrade content"
        );
        assert!(
            rollback.to_string_lossy().contains(".bak."),
            "backup is a timestamped sibling"
        );
    }

    #[test]
    #[cfg(unix)]
    fn upgraded_artifact_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let fx = Fixture::new(b"binary v1");
        let fetcher = MockFetcher::new().with(URL, b"binary v2");
        run(&fx.artifact(), URL, &fetcher, &fx.audit(), false).expect("upgrade");
        let mode = std::fs::metadata(fx.artifact())
            .expect("metadata")
            .permissions()
            .mode();
        assert!(mode & 0o100 != 0, "executable bit must be set");
    }

    #[test]
    fn fetch_failure_changes_nothing() {
        let fx = Fixture::new(b"binary v1");
        let fetcher = MockFetcher::new(); // no response for URL
        let err = run(&fx.artifact(), URL, &fetcher, &fx.audit(), false)
            .expect_err("fetch should fail");
        assert!(matches!(err, UpgradeError::FetchFailed(_)));
        assert_eq!(std::fs::read(fx.artifact()).expect("read"), b"binary v1");
        assert!(fx.backups().is_empty());
    }

    #[test]
    fn missing_artifact_fails_at_backup_not_after() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifact = dir.path().join("omzmini");
        let audit = AuditLog::new(&dir.path().join("audit.log"), true);
        let fetcher = MockFetcher::new().with(URL, b"binary v2");
        let err = run(&artifact, URL, &fetcher, &audit, false).expect_err("no artifact to back up");
        assert!(matches!(err, UpgradeError::BackupFailed { .. }));
        assert!(!artifact.exists(), "nothing may be written without a backup");
    }

    #[test]
    fn dry_run_previews_without_writing() {
        let fx = Fixture::new(b"binary v1");
        let audit = fx.audit();
        let fetcher = MockFetcher::new().with(URL, b"binary v2");
        let report = run(&fx.artifact(), URL, &fetcher, &audit, true).expect("preview");
        assert!(report.detail.starts_with("would back up to"));
        assert_eq!(std::fs::read(fx.artifact()).expect("read"), b"binary v1");
        assert!(fx.backups().is_empty());
        assert!(!audit.path().exists(), "dry run must not append audit records");
    }

    #[test]
    fn terminal_state_is_audited() {
        let fx = Fixture::new(b"binary v1");
        let audit = fx.audit();
        let fetcher = MockFetcher::new().with(URL, b"binary v2");
        run(&fx.artifact(), URL, &fetcher, &audit, false).expect("upgrade");
        let content = std::fs::read_to_string(audit.path()).expect("audit file");
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"verb\":\"upgrade\""));
        assert!(content.contains("\"outcome\":\"success\""));
    }

    #[test]
    fn backup_path_appends_timestamp_suffix() {
        let p = backup_path(Path::new("/bin/omzmini"), "20260830120000");
        assert_eq!(p, Path::new("/bin/omzmini.bak.20260830120000"));
    }
}
