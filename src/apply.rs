//! Plan execution: fetch, atomic write, post-write verification.
//!
//! Each plan action is applied independently; a failed fetch or write marks
//! that entry's outcome as failed and the remaining actions continue. Writes
//! go to a temporary sibling path and are renamed into place, so no observer
//! ever sees a partially written file. Every executed action produces
//! exactly one [`AuditRecord`]; the audit sink never influences control
//! flow.
//!
//! Dry-run mode shares the plan and emits byte-identical action
//! descriptions while performing no fetch, no write, and no audit append —
//! a true preview.

use std::path::{Path, PathBuf};

use crate::audit::{AuditLog, AuditRecord, Outcome, Verb};
use crate::digest::{sha256_bytes, sha256_file};
use crate::error::ApplyError;
use crate::fetch::{Fetcher, RemoteCache};
use crate::hashcache::HashCache;
use crate::plan::{Plan, PlanAction};

/// Result of applying a plan: one record per action, in plan order.
#[derive(Debug)]
pub struct ApplyReport {
    /// Audit records in invocation order.
    pub records: Vec<AuditRecord>,
}

impl ApplyReport {
    /// Number of actions that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Failed)
            .count()
    }

    /// Number of actions that fetched or restored content.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.records
            .iter()
            .filter(|r| {
                r.outcome == Outcome::Success && matches!(r.verb, Verb::Fetch | Verb::Restore)
            })
            .count()
    }
}

/// Apply `plan` in order.
///
/// With `dry_run` set, no fetch, write, or audit append happens; the
/// returned records carry the same action descriptions the real executor
/// would log.
pub fn run(
    plan: &Plan,
    fetcher: &dyn Fetcher,
    cache: &mut RemoteCache,
    audit: &AuditLog,
    hashes: &mut HashCache,
    dry_run: bool,
) -> ApplyReport {
    let mut records = Vec::with_capacity(plan.len());

    for action in &plan.actions {
        let record = if dry_run {
            preview(action)
        } else {
            let record = execute(action, fetcher, cache, hashes);
            audit.append(&record);
            record
        };
        records.push(record);
    }

    ApplyReport { records }
}

/// Produce the preview record for one action without side effects.
fn preview(action: &PlanAction) -> AuditRecord {
    let description = action.description();
    tracing::info!("would {description}");
    AuditRecord::now(
        action.verb,
        &action.target.local_path,
        Outcome::Success,
        &description,
    )
}

/// Execute one action for real.
fn execute(
    action: &PlanAction,
    fetcher: &dyn Fetcher,
    cache: &mut RemoteCache,
    hashes: &mut HashCache,
) -> AuditRecord {
    let description = action.description();
    let path = &action.target.local_path;

    match action.verb {
        Verb::SkipPinned | Verb::SkipCurrent => {
            tracing::debug!("{description}");
            AuditRecord::now(action.verb, path, Outcome::Success, &description)
        }
        Verb::Fetch | Verb::Restore | Verb::Upgrade => {
            match fetch_and_install(action, fetcher, cache) {
                Ok(digest) => {
                    tracing::info!("{description}");
                    if let Err(e) = hashes.record(path, &digest) {
                        tracing::warn!("recording remote digest failed: {e}");
                    }
                    AuditRecord::now(action.verb, path, Outcome::Success, &description)
                }
                Err(e) => {
                    tracing::warn!("{description} failed: {e}");
                    AuditRecord::now(action.verb, path, Outcome::Failed, &e.to_string())
                }
            }
        }
    }
}

/// Fetch the entry's remote content and install it atomically, returning
/// the content digest.
fn fetch_and_install(
    action: &PlanAction,
    fetcher: &dyn Fetcher,
    cache: &mut RemoteCache,
) -> anyhow::Result<String> {
    let target = &action.target;
    let bytes = cache.get(fetcher, &target.remote_location)?.to_vec();
    let expected = sha256_bytes(&bytes);
    write_atomic(&target.local_path, &bytes)?;
    verify_installed(&target.local_path, &expected)?;
    Ok(expected)
}

/// Re-read `path` and check it hashes to `expected`.
///
/// The installed file must hash to the fetched content; a disagreement is
/// surfaced as [`ApplyError::IntegrityMismatch`], never silently accepted.
///
/// # Errors
///
/// Returns [`ApplyError::Io`] if the file cannot be re-read and
/// [`ApplyError::IntegrityMismatch`] if the digests disagree.
fn verify_installed(path: &Path, expected: &str) -> Result<(), ApplyError> {
    let actual = sha256_file(path).map_err(|e| ApplyError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::other(e.to_string()),
    })?;
    if actual != expected {
        return Err(ApplyError::IntegrityMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Write `bytes` to `path` via a temporary sibling file and atomic rename.
///
/// The rename guarantees the previous content stays intact if anything
/// interrupts the staging write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ApplyError> {
    let io_err = |source| ApplyError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = staging_path(path);
    std::fs::write(&tmp, bytes).map_err(io_err)?;
    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(source));
    }
    Ok(())
}

/// Temporary sibling path used for staging (same directory, `.new` suffix,
/// so the rename never crosses a filesystem boundary).
fn staging_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let name = path.file_name().map_or_else(
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
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::catalog::{DesiredItem, resolve_item};
    use crate::fetch::test_helpers::MockFetcher;
    use crate::plan::Plan;

    const BASE: &str = "https://remote.test/omz";

    struct Fixture {
        root: tempfile::TempDir,
        config: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                root: tempfile::tempdir().expect("root"),
                config: tempfile::tempdir().expect("config"),
            }
        }

        fn action(&self, rel: &str, verb: Verb) -> PlanAction {
            let entries = resolve_item(&DesiredItem::core(), self.root.path(), BASE)
                .expect("resolve core");
            let target = entries
                .into_iter()
                .find(|e| e.rel == rel)
                .expect("known rel");
            PlanAction { target, verb }
        }

        fn audit(&self) -> AuditLog {
            AuditLog::new(&self.config.path().join("audit.log"), true)
        }

        fn hashes(&self) -> HashCache {
            HashCache::load(&self.config.path().join("hashes.txt")).expect("hashes")
        }
    }

    // -----------------------------------------------------------------------
    // write_atomic
    // -----------------------------------------------------------------------

    #[test]
    fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lib/deep/file.zsh");
        write_atomic(&path, b"content").expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"content");
    }

    #[test]
    fn write_atomic_leaves_no_staging_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("file.zsh");
        write_atomic(&path, b"content").expect("write");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn staging_path_is_sibling_with_new_suffix() {
        let p = staging_path(Path::new("/omz/lib/history.zsh"));
        assert_eq!(p, Path::new("/omz/lib/history.zsh.new"));
    }

    // -----------------------------------------------------------------------
    // verify_installed
    // -----------------------------------------------------------------------

    #[test]
    fn verification_accepts_matching_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lib/history.zsh");
        write_atomic(&path, b"fetched bytes").expect("write");
        verify_installed(&path, &sha256_bytes(b"fetched bytes")).expect("verify");
    }

    #[test]
    fn tampered_install_is_reported_as_integrity_mismatch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("oh-my-zsh.sh");
        let expected = sha256_bytes(b"fetched bytes");
        write_atomic(&path, b"fetched bytes").expect("write");
        // Another writer changes the file between install and verification.
        std::fs::write(&path, b"tampered").expect("tamper");

        let err = verify_installed(&path, &expected).expect_err("must reject");
        match &err {
            ApplyError::IntegrityMismatch {
                path: p,
                expected: e,
                actual,
            } => {
                assert_eq!(p, &path);
                assert_eq!(e, &expected);
                assert_eq!(actual, &sha256_bytes(b"tampered"));
            }
            other => panic!("expected an integrity mismatch, got {other}"),
        }
        // The executor surfaces this error text as the failed record's detail.
        let record = AuditRecord::now(Verb::Fetch, &path, Outcome::Failed, &err.to_string());
        assert_eq!(record.outcome, Outcome::Failed);
        assert!(record.detail.contains("integrity mismatch"));
    }

    // -----------------------------------------------------------------------
    // run: fetch path
    // -----------------------------------------------------------------------

    #[test]
    fn fetch_writes_content_and_records_success() {
        let fx = Fixture::new();
        let action = fx.action("oh-my-zsh.sh", Verb::Fetch);
        let fetcher = MockFetcher::new().with(&action.target.remote_location, b"#!/bin/zsh\n");
        let mut cache = RemoteCache::new();
        let mut hashes = fx.hashes();

        let report = run(
            &Plan {
                actions: vec![action.clone()],
            },
            &fetcher,
            &mut cache,
            &fx.audit(),
            &mut hashes,
            false,
        );

        assert_eq!(report.failures(), 0);
        assert_eq!(report.writes(), 1);
        assert_eq!(
            std::fs::read(&action.target.local_path).expect("read"),
            b"#!/bin/zsh\n"
        );
        assert_eq!(
            hashes.get(&action.target.local_path),
            Some(sha256_bytes(b"#!/bin/zsh\n").as_str()),
            "remote digest must be recorded for diagnostics"
        );
    }

    #[test]
    fn fetch_failure_is_per_entry_and_non_aborting() {
        let fx = Fixture::new();
        let failing = fx.action("oh-my-zsh.sh", Verb::Fetch);
        let working = fx.action("lib/history.zsh", Verb::Fetch);
        // Only the second action has a remote response.
        let fetcher = MockFetcher::new().with(&working.target.remote_location, b"ok");
        let mut cache = RemoteCache::new();
        let mut hashes = fx.hashes();

        let report = run(
            &Plan {
                actions: vec![failing.clone(), working.clone()],
            },
            &fetcher,
            &mut cache,
            &fx.audit(),
            &mut hashes,
            false,
        );

        assert_eq!(report.failures(), 1);
        assert_eq!(report.records[0].outcome, Outcome::Failed);
        assert_eq!(report.records[1].outcome, Outcome::Success);
        assert!(!failing.target.local_path.exists());
        assert!(working.target.local_path.exists(), "later entries continue");
    }

    #[test]
    fn fetch_overwrites_outdated_content_atomically() {
        let fx = Fixture::new();
        let action = fx.action("oh-my-zsh.sh", Verb::Fetch);
        std::fs::write(&action.target.local_path, b"old").expect("seed");
        let fetcher = MockFetcher::new().with(&action.target.remote_location, b"new");
        let mut cache = RemoteCache::new();
        let mut hashes = fx.hashes();

        run(
            &Plan {
                actions: vec![action.clone()],
            },
            &fetcher,
            &mut cache,
            &fx.audit(),
            &mut hashes,
            false,
        );
        assert_eq!(std::fs::read(&action.target.local_path).expect("read"), b"new");
    }

    #[test]
    fn interrupted_write_leaves_previous_content_intact() {
        let fx = Fixture::new();
        let action = fx.action("oh-my-zsh.sh", Verb::Fetch);
        std::fs::write(&action.target.local_path, b"known good").expect("seed");
        let before = sha256_file(&action.target.local_path).expect("digest");

        // A directory squatting on the staging path makes the staging write
        // fail before any rename can happen.
        std::fs::create_dir(staging_path(&action.target.local_path)).expect("block staging");
        let fetcher = MockFetcher::new().with(&action.target.remote_location, b"candidate");
        let mut cache = RemoteCache::new();
        let mut hashes = fx.hashes();

        let report = run(
            &Plan {
                actions: vec![action.clone()],
            },
            &fetcher,
            &mut cache,
            &fx.audit(),
            &mut hashes,
            false,
        );

        assert_eq!(report.failures(), 1);
        let after = sha256_file(&action.target.local_path).expect("digest");
        assert_eq!(before, after, "previous content must survive a failed write");
    }

    #[test]
    fn skip_actions_write_nothing_but_are_recorded() {
        let fx = Fixture::new();
        let pinned = fx.action("oh-my-zsh.sh", Verb::SkipPinned);
        let current = fx.action("lib/history.zsh", Verb::SkipCurrent);
        let fetcher = MockFetcher::new();
        let mut cache = RemoteCache::new();
        let mut hashes = fx.hashes();

        let report = run(
            &Plan {
                actions: vec![pinned, current],
            },
            &fetcher,
            &mut cache,
            &fx.audit(),
            &mut hashes,
            false,
        );

        assert_eq!(report.failures(), 0);
        assert_eq!(report.writes(), 0);
        assert_eq!(fetcher.calls(), 0, "skips must not touch the network");
        assert_eq!(report.records.len(), 2);
    }

    #[test]
    fn every_action_appends_one_audit_record() {
        let fx = Fixture::new();
        let ok = fx.action("oh-my-zsh.sh", Verb::Fetch);
        let skip = fx.action("lib/history.zsh", Verb::SkipCurrent);
        let fail = fx.action("tools/upgrade.sh", Verb::Fetch);
        let fetcher = MockFetcher::new().with(&ok.target.remote_location, b"ok");
        let mut cache = RemoteCache::new();
        let mut hashes = fx.hashes();
        let audit = fx.audit();

        run(
            &Plan {
                actions: vec![ok, skip, fail],
            },
            &fetcher,
            &mut cache,
            &audit,
            &mut hashes,
            false,
        );

        let content = std::fs::read_to_string(audit.path()).expect("audit file");
        assert_eq!(content.lines().count(), 3, "one record per action");
    }

    // -----------------------------------------------------------------------
    // run: dry-run
    // -----------------------------------------------------------------------

    #[test]
    fn dry_run_never_fetches_writes_or_logs() {
        let fx = Fixture::new();
        let action = fx.action("oh-my-zsh.sh", Verb::Fetch);
        let fetcher = MockFetcher::new().with(&action.target.remote_location, b"content");
        let mut cache = RemoteCache::new();
        let mut hashes = fx.hashes();
        let audit = fx.audit();

        let report = run(
            &Plan {
                actions: vec![action.clone()],
            },
            &fetcher,
            &mut cache,
            &audit,
            &mut hashes,
            true,
        );

        assert_eq!(fetcher.calls(), 0, "dry run must not fetch");
        assert!(!action.target.local_path.exists(), "dry run must not write");
        assert!(!audit.path().exists(), "dry run must not append audit records");
        assert_eq!(report.records.len(), 1);
    }

    #[test]
    fn dry_run_descriptions_match_real_executor() {
        let fx = Fixture::new();
        let action = fx.action("oh-my-zsh.sh", Verb::Fetch);
        let fetcher = MockFetcher::new().with(&action.target.remote_location, b"content");
        let plan = Plan {
            actions: vec![action],
        };

        let mut cache = RemoteCache::new();
        let mut hashes = fx.hashes();
        let dry = run(&plan, &fetcher, &mut cache, &fx.audit(), &mut hashes, true);
        let real = run(&plan, &fetcher, &mut cache, &fx.audit(), &mut hashes, false);

        assert_eq!(
            dry.records[0].detail, real.records[0].detail,
            "dry-run output must be a byte-identical preview"
        );
    }
}
