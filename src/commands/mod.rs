//! Top-level subcommand orchestration.

pub mod diff;
pub mod doctor;
pub mod pin;
pub mod restore;
pub mod status;
pub mod sync;
pub mod upgrade;

use anyhow::{Context as _, Result};

use crate::catalog::{self, Resolution};
use crate::cli::GlobalOpts;
use crate::context::Context;
use crate::zshrc::{self, Declaration};

/// Shared state produced by the common command setup sequence.
///
/// Builds the invocation context, reads the declaration file, and resolves
/// the desired set against the catalog so each command does not repeat the
/// boilerplate. Unknown declared items are reported here as warnings; a
/// duplicate target path aborts.
#[derive(Debug)]
pub struct CommandSetup {
    /// Invocation context (paths, environment overrides).
    pub ctx: Context,
    /// Parsed declaration from the zshrc file.
    pub declaration: Declaration,
    /// Catalog resolution of the declared items.
    pub resolution: Resolution,
}

impl CommandSetup {
    /// Build the context, read `~/.zshrc`, and resolve the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration file is missing or malformed, a
    /// persistent store cannot be read, or two declared items resolve to
    /// the same local path.
    pub fn init(global: &GlobalOpts) -> Result<Self> {
        let ctx = Context::from_env(
            global.root.clone(),
            global.zshrc.clone(),
            global.remote_base.clone(),
            global.audit,
            global.dry_run,
        )?;

        let declaration = zshrc::read(&ctx.paths.zshrc)
            .with_context(|| format!("reading declaration {}", ctx.paths.zshrc.display()))?;
        for line in &declaration.ignored {
            tracing::warn!("ignoring unparseable declaration line: {line}");
        }

        let resolution = catalog::resolve_all(&declaration, &ctx.paths.root, &ctx.remote_base)?;
        for unknown in &resolution.unknown {
            tracing::warn!("{unknown}");
        }
        tracing::debug!(
            "{} entries resolved, {} pins loaded",
            resolution.entries.len(),
            ctx.pins.len()
        );

        Ok(Self {
            ctx,
            declaration,
            resolution,
        })
    }
}
