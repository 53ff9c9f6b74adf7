//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the reconciliation engine.
#[derive(Parser, Debug)]
#[command(
    name = "omzmini",
    about = "Minimal oh-my-zsh reconciliation and self-upgrade engine",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Override the managed tree root (default ~/.oh-my-zsh)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Override the declaration file (default ~/.zshrc)
    #[arg(long, global = true)]
    pub zshrc: Option<PathBuf>,

    /// Override the remote content base URL
    #[arg(long, global = true)]
    pub remote_base: Option<String>,

    /// Preview actions without fetching or writing
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Disable the append-only audit log for this run
    #[arg(long = "no-audit", global = true, action = clap::ArgAction::SetFalse)]
    pub audit: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile the managed tree with the .zshrc declaration
    Sync,
    /// Re-fetch missing files only, leaving existing files untouched
    Restore,
    /// Show the inspected status of every declared entry
    Status,
    /// Show a unified diff of local content against remote content
    Diff(DiffOpts),
    /// Pin local paths so they are never overwritten
    Pin(PinOpts),
    /// Remove pins from local paths
    Unpin(PinOpts),
    /// Replace this program with the latest remote build
    Upgrade(UpgradeOpts),
    /// Run read-only diagnostics on the setup
    Doctor,
    /// Print version information
    Version,
}

/// Options for the `diff` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DiffOpts {
    /// Item to diff: "core", a plugin name, or a theme name
    pub item: String,
}

/// Options for the `pin` and `unpin` subcommands.
#[derive(Parser, Debug, Clone)]
pub struct PinOpts {
    /// Local paths to pin or unpin
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Options for the `upgrade` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UpgradeOpts {
    /// Candidate artifact URL (default: the program's file name under the
    /// remote base)
    #[arg(long)]
    pub url: Option<String>,
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
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_sync() {
        let cli = Cli::try_parse_from(["omzmini", "sync"]).expect("parse");
        assert!(matches!(cli.command, Command::Sync));
        assert!(!cli.global.dry_run);
        assert!(cli.global.audit);
    }

    #[test]
    fn parse_sync_dry_run_short() {
        let cli = Cli::try_parse_from(["omzmini", "sync", "-d"]).expect("parse");
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_no_audit() {
        let cli = Cli::try_parse_from(["omzmini", "sync", "--no-audit"]).expect("parse");
        assert!(!cli.global.audit);
    }

    #[test]
    fn parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "omzmini",
            "status",
            "--root",
            "/tmp/omz",
            "--zshrc",
            "/tmp/zshrc",
            "--remote-base",
            "https://mirror.test/omz",
        ])
        .expect("parse");
        assert_eq!(cli.global.root, Some(PathBuf::from("/tmp/omz")));
        assert_eq!(cli.global.zshrc, Some(PathBuf::from("/tmp/zshrc")));
        assert_eq!(
            cli.global.remote_base.as_deref(),
            Some("https://mirror.test/omz")
        );
    }

    #[test]
    fn parse_diff_requires_item() {
        assert!(Cli::try_parse_from(["omzmini", "diff"]).is_err());
        let cli = Cli::try_parse_from(["omzmini", "diff", "git"]).expect("parse");
        match cli.command {
            Command::Diff(opts) => assert_eq!(opts.item, "git"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_pin_requires_at_least_one_path() {
        assert!(Cli::try_parse_from(["omzmini", "pin"]).is_err());
        let cli =
            Cli::try_parse_from(["omzmini", "pin", "/omz/a", "/omz/b"]).expect("parse");
        match cli.command {
            Command::Pin(opts) => assert_eq!(opts.paths.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_upgrade_with_url() {
        let cli = Cli::try_parse_from([
            "omzmini",
            "upgrade",
            "--url",
            "https://mirror.test/omzmini",
        ])
        .expect("parse");
        match cli.command {
            Command::Upgrade(opts) => {
                assert_eq!(opts.url.as_deref(), Some("https://mirror.test/omzmini"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["omzmini", "doctor", "--verbose"]).expect("parse");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Doctor));
    }
}
