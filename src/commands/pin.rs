//! Commands: pin and unpin local paths.

use anyhow::Result;

use crate::cli::{GlobalOpts, PinOpts};
use crate::context::Context;

/// Add the given paths to the pin store.
///
/// # Errors
///
/// Returns an error if the pin store cannot be loaded or persisted.
pub fn pin(global: &GlobalOpts, opts: &PinOpts) -> Result<()> {
    let mut ctx = load(global)?;
    for path in &opts.paths {
        if ctx.pins.add(path)? {
            println!("pinned {}", path.display());
        } else {
            println!("already pinned: {}", path.display());
        }
    }
    Ok(())
}

/// Remove the given paths from the pin store.
///
/// # Errors
///
/// Returns an error if the pin store cannot be loaded or persisted.
pub fn unpin(global: &GlobalOpts, opts: &PinOpts) -> Result<()> {
    let mut ctx = load(global)?;
    for path in &opts.paths {
        if ctx.pins.remove(path)? {
            println!("unpinned {}", path.display());
        } else {
            println!("not pinned: {}", path.display());
        }
    }
    Ok(())
}

fn load(global: &GlobalOpts) -> Result<Context> {
    Context::from_env(
        global.root.clone(),
        global.zshrc.clone(),
        global.remote_base.clone(),
        global.audit,
        global.dry_run,
    )
}
