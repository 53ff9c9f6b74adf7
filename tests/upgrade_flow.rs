#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing
)]
//! Integration tests for the self-upgrade flow: backup ordering,
//! idempotence, and the audit trail across consecutive runs.

mod common;

use std::path::PathBuf;

use common::StaticFetcher;
use omzmini::audit::AuditLog;
use omzmini::upgrade::{self, UpgradeState};

const URL: &str = "https://remote.test/releases/omzmini";

struct UpgradeEnv {
    dir: tempfile::TempDir,
}

impl UpgradeEnv {
    fn new(current: &[u8]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("omzmini"), current).expect("seed artifact");
        Self { dir }
    }

    fn artifact(&self) -> PathBuf {
        self.dir.path().join("omzmini")
    }

    fn audit(&self) -> AuditLog {
        AuditLog::new(&self.dir.path().join("audit.jsonl"), true)
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

/// Upgrade, then upgrade again: the second run short-circuits on the digest
/// comparison and creates no second backup.
#[test]
fn upgrade_then_upgrade_again_is_idempotent() {
    let env = UpgradeEnv::new(b"release v1");
    let audit = env.audit();
    let fetcher = StaticFetcher::new().with(URL, b"release v2");

    let first = upgrade::run(&env.artifact(), URL, &fetcher, &audit, false).expect("first run");
    assert_eq!(first.state, UpgradeState::Done);
    assert!(first.rollback_path.is_some());
    assert_eq!(std::fs::read(env.artifact()).unwrap(), b"release v2");

    let second = upgrade::run(&env.artifact(), URL, &fetcher, &audit, false).expect("second run");
    assert_eq!(second.state, UpgradeState::Done);
    assert_eq!(second.rollback_path, None);
    assert_eq!(second.detail, "already up to date");
    assert_eq!(env.backups().len(), 1, "only the first run backs up");
}

/// The backup made before replacement holds the exact pre-upgrade bytes,
/// so an explicit rollback restores the previous build.
#[test]
fn rollback_path_restores_previous_build() {
    let env = UpgradeEnv::new(b"release v1");
    let fetcher = StaticFetcher::new().with(URL, b"release v2");

    let report =
        upgrade::run(&env.artifact(), URL, &fetcher, &env.audit(), false).expect("upgrade");
    let backup = report.rollback_path.expect("backup created");

    // Explicit external rollback: copy the backup over the artifact.
    std::fs::copy(&backup, env.artifact()).expect("rollback copy");
    assert_eq!(std::fs::read(env.artifact()).unwrap(), b"release v1");
}

/// Consecutive runs append one audit record each, in order.
#[test]
fn each_run_appends_one_audit_record() {
    let env = UpgradeEnv::new(b"release v1");
    let audit = env.audit();
    let fetcher = StaticFetcher::new().with(URL, b"release v2");

    upgrade::run(&env.artifact(), URL, &fetcher, &audit, false).expect("first run");
    upgrade::run(&env.artifact(), URL, &fetcher, &audit, false).expect("second run");

    let content = std::fs::read_to_string(audit.path()).expect("audit file");
    let details: Vec<String> = content
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).expect("json line");
            assert_eq!(v["verb"], "upgrade");
            v["detail"].as_str().expect("detail").to_string()
        })
        .collect();
    assert_eq!(details.len(), 2);
    assert!(details[0].starts_with("replaced"));
    assert_eq!(details[1], "already up to date");
}

/// An unreachable candidate URL leaves the artifact byte-identical and
/// records the failure.
#[test]
fn failed_fetch_is_audited_and_leaves_artifact_alone() {
    let env = UpgradeEnv::new(b"release v1");
    let audit = env.audit();
    let fetcher = StaticFetcher::new();

    let err = upgrade::run(&env.artifact(), URL, &fetcher, &audit, false)
        .expect_err("fetch must fail");
    assert!(err.to_string().contains("404"));
    assert_eq!(std::fs::read(env.artifact()).unwrap(), b"release v1");

    let content = std::fs::read_to_string(audit.path()).expect("audit file");
    let v: serde_json::Value = serde_json::from_str(content.trim()).expect("json line");
    assert_eq!(v["outcome"], "failed");
}
