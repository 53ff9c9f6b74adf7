//! Command: re-fetch missing files only.

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::commands::CommandSetup;
use crate::{apply, plan, state};

/// Restore absent entries; existing files, even outdated ones, stay put.
///
/// # Errors
///
/// Returns an error if setup fails or any restore action failed.
pub fn run(global: &GlobalOpts) -> Result<()> {
    let mut setup = CommandSetup::init(global)?;
    let ctx = &mut setup.ctx;

    let states = state::inspect(
        &setup.resolution.entries,
        &ctx.pins,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
    );
    let plan = plan::build_restore(&states);

    if plan.is_empty() {
        println!("nothing to restore");
        return Ok(());
    }

    let report = apply::run(
        &plan,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
        &ctx.audit,
        &mut ctx.hashes,
        ctx.dry_run,
    );

    if ctx.dry_run {
        println!("dry run: {} would be restored", plan.len());
    } else {
        println!(
            "restore complete: {} restored, {} failed",
            report.writes(),
            report.failures()
        );
    }

    if report.failures() > 0 {
        anyhow::bail!("{} of {} restores failed", report.failures(), plan.len());
    }
    Ok(())
}
