//! Command: read-only diagnostics on the setup.
//!
//! Doctor never touches the network; it reports what can be judged from
//! the local filesystem and the persistent stores alone.

use anyhow::Result;

use crate::catalog;
use crate::cli::GlobalOpts;
use crate::context::Context;
use crate::error::DeclarationError;
use crate::zshrc;

/// Print diagnostics: declaration, core file, catalog resolution, pins,
/// and the last-known remote digest cache.
///
/// # Errors
///
/// Returns an error only if the persistent stores cannot be read; an
/// absent or malformed declaration is a finding, not a failure.
pub fn run(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::from_env(
        global.root.clone(),
        global.zshrc.clone(),
        global.remote_base.clone(),
        global.audit,
        global.dry_run,
    )?;

    println!("running diagnostics");

    let declaration = match zshrc::read(&ctx.paths.zshrc) {
        Ok(d) => {
            println!("ok   declaration found at {}", ctx.paths.zshrc.display());
            Some(d)
        }
        Err(DeclarationError::Missing { path }) => {
            println!("FAIL declaration missing: {}", path.display());
            None
        }
        Err(e) => {
            println!("FAIL declaration unreadable: {e}");
            None
        }
    };

    let core_file = ctx.paths.root.join("oh-my-zsh.sh");
    if core_file.exists() {
        println!("ok   core file present: {}", core_file.display());
    } else {
        println!("FAIL core file missing: {} (run sync)", core_file.display());
    }

    if let Some(decl) = &declaration {
        if decl.plugins.is_empty() {
            println!("warn no plugins declared");
        } else {
            println!("ok   {} plugins declared", decl.plugins.len());
        }
        if decl.theme.is_none() {
            println!("warn no theme declared");
        }
        for line in &decl.ignored {
            println!("warn unparseable declaration line: {line}");
        }

        match catalog::resolve_all(decl, &ctx.paths.root, &ctx.remote_base) {
            Ok(resolution) => {
                println!("ok   {} catalog entries resolved", resolution.entries.len());
                for unknown in &resolution.unknown {
                    println!("warn {unknown}");
                }
            }
            Err(e) => println!("FAIL catalog resolution: {e}"),
        }
    }

    println!("ok   {} pinned paths", ctx.pins.len());
    println!("ok   {} remote digests recorded", ctx.hashes.len());
    if ctx.audit.enabled() {
        println!("ok   audit log at {}", ctx.audit.path().display());
    } else {
        println!("warn audit log disabled");
    }
    Ok(())
}
