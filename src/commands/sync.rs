//! Command: reconcile the managed tree with the declaration.

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::commands::CommandSetup;
use crate::{apply, plan, state};

/// Inspect every declared entry, plan, and apply.
///
/// # Errors
///
/// Returns an error if setup fails or any plan action failed to apply.
pub fn run(global: &GlobalOpts) -> Result<()> {
    let mut setup = CommandSetup::init(global)?;
    let ctx = &mut setup.ctx;

    let states = state::inspect(
        &setup.resolution.entries,
        &ctx.pins,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
    );
    let plan = plan::build(&states);
    tracing::debug!("{} actions planned, {} writes", plan.len(), plan.write_count());

    let report = apply::run(
        &plan,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
        &ctx.audit,
        &mut ctx.hashes,
        ctx.dry_run,
    );

    let skipped = plan.len() - plan.write_count();
    if ctx.dry_run {
        println!(
            "dry run: {} would be written, {} skipped",
            plan.write_count(),
            skipped
        );
    } else {
        println!(
            "sync complete: {} written, {} skipped, {} failed",
            report.writes(),
            skipped,
            report.failures()
        );
    }

    if report.failures() > 0 {
        anyhow::bail!("{} of {} actions failed", report.failures(), plan.len());
    }
    Ok(())
}
