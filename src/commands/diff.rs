//! Command: unified diff of local content against remote content.

use anyhow::Result;

use crate::catalog::{CatalogEntry, DesiredItem, resolve_item};
use crate::cli::{DiffOpts, GlobalOpts};
use crate::context::Context;
use crate::diff;
use crate::error::CatalogError;

/// Print the unified diff for one item ("core", a plugin, or a theme).
///
/// Read-only; a fetch failure for an entry is reported as unavailable
/// rather than aborting the remaining entries.
///
/// # Errors
///
/// Returns an error if the context cannot be built or the item is unknown
/// to the catalog.
pub fn run(global: &GlobalOpts, opts: &DiffOpts) -> Result<()> {
    let mut ctx = Context::from_env(
        global.root.clone(),
        global.zshrc.clone(),
        global.remote_base.clone(),
        global.audit,
        global.dry_run,
    )?;

    let entries = lookup(&opts.item, &ctx)?;
    for entry in &entries {
        match diff::unified(entry, ctx.fetcher.as_ref(), &mut ctx.cache) {
            Ok(d) if d.is_identical() => {
                println!("{}: identical to remote", entry.local_path.display());
            }
            Ok(d) => print!("{}", d.text),
            Err(e) => {
                println!("{}: diff unavailable ({e})", entry.local_path.display());
            }
        }
    }
    Ok(())
}

/// Resolve an item name against the catalog: "core", then plugins, then
/// themes.
fn lookup(item: &str, ctx: &Context) -> Result<Vec<CatalogEntry>> {
    let root = &ctx.paths.root;
    let base = &ctx.remote_base;

    if item == "core" {
        return Ok(resolve_item(&DesiredItem::core(), root, base)?);
    }
    match resolve_item(&DesiredItem::plugin(item), root, base) {
        Ok(entries) => Ok(entries),
        Err(CatalogError::UnknownItem { .. }) => {
            match resolve_item(&DesiredItem::theme(item), root, base) {
                Ok(entries) => Ok(entries),
                Err(CatalogError::UnknownItem { .. }) => {
                    anyhow::bail!("unknown item: {item} (not a known plugin or theme)")
                }
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}
