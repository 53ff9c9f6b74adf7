//! Command: replace the running program with the latest remote build.

use anyhow::{Context as _, Result};

use crate::audit::{AuditRecord, Outcome, Verb};
use crate::cli::{GlobalOpts, UpgradeOpts};
use crate::context::Context;
use crate::upgrade;

/// Run the self-upgrade state machine against the current executable.
///
/// A pinned executable path is honoured like any other pin: the upgrade is
/// skipped entirely.
///
/// # Errors
///
/// Returns an error if the executable path cannot be determined or the
/// upgrade fails at any stage.
pub fn run(global: &GlobalOpts, opts: &UpgradeOpts) -> Result<()> {
    let ctx = Context::from_env(
        global.root.clone(),
        global.zshrc.clone(),
        global.remote_base.clone(),
        global.audit,
        global.dry_run,
    )?;

    let artifact = std::env::current_exe().context("locating the current executable")?;

    if ctx.pins.contains(&artifact) {
        println!("{} is pinned, skipping upgrade", artifact.display());
        ctx.audit.append(&AuditRecord::now(
            Verb::SkipPinned,
            &artifact,
            Outcome::Success,
            "upgrade skipped",
        ));
        return Ok(());
    }

    let url = opts.url.clone().unwrap_or_else(|| {
        let name = artifact
            .file_name()
            .map_or_else(|| "omzmini".to_string(), |n| n.to_string_lossy().into_owned());
        format!("{}/{name}", ctx.remote_base)
    });

    let report = upgrade::run(
        &artifact,
        &url,
        ctx.fetcher.as_ref(),
        &ctx.audit,
        ctx.dry_run,
    )?;

    println!("{}", report.detail);
    Ok(())
}
