//! Command: show the inspected status of every declared entry.

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::commands::CommandSetup;
use crate::state::{self, Status};

/// Inspect and print one line per resolved entry, plus a summary.
///
/// # Errors
///
/// Returns an error if setup fails.
pub fn run(global: &GlobalOpts) -> Result<()> {
    let mut setup = CommandSetup::init(global)?;
    let ctx = &mut setup.ctx;

    if let Some(theme) = &setup.declaration.theme {
        println!("theme: {theme}");
    } else {
        println!("theme: (none declared)");
    }
    if setup.declaration.plugins.is_empty() {
        println!("plugins: (none declared)");
    } else {
        println!("plugins: {}", setup.declaration.plugins.join(", "));
    }
    println!();

    let states = state::inspect(
        &setup.resolution.entries,
        &ctx.pins,
        ctx.fetcher.as_ref(),
        &mut ctx.cache,
    );

    let mut current = 0usize;
    let mut absent = 0usize;
    let mut outdated = 0usize;
    let mut corrupted = 0usize;
    let mut pinned = 0usize;
    for s in &states {
        println!("{:<12} {}", s.status.as_str(), s.local_path().display());
        match s.status {
            Status::Absent => absent += 1,
            Status::Current => current += 1,
            Status::Outdated => outdated += 1,
            Status::Corrupted => corrupted += 1,
            Status::PinnedSkip => pinned += 1,
        }
    }

    println!();
    println!(
        "{} entries: {current} current, {absent} absent, {outdated} outdated, \
         {corrupted} corrupted, {pinned} pinned",
        states.len()
    );
    Ok(())
}
