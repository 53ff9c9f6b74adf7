//! Binary entry point for the `omzmini` CLI.

use anyhow::Result;
use clap::Parser;

use omzmini::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);

    match args.command {
        cli::Command::Sync => commands::sync::run(&args.global),
        cli::Command::Restore => commands::restore::run(&args.global),
        cli::Command::Status => commands::status::run(&args.global),
        cli::Command::Diff(opts) => commands::diff::run(&args.global, &opts),
        cli::Command::Pin(opts) => commands::pin::pin(&args.global, &opts),
        cli::Command::Unpin(opts) => commands::pin::unpin(&args.global, &opts),
        cli::Command::Upgrade(opts) => commands::upgrade::run(&args.global, &opts),
        cli::Command::Doctor => commands::doctor::run(&args.global),
        cli::Command::Version => {
            let version = option_env!("OMZMINI_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("omzmini {version}");
            Ok(())
        }
    }
}
