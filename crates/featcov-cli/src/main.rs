//! Featcov CLI: the `featcov` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing::debug;

fn main() {
    let cli = Cli::parse();
    support::init_logging(cli.verbose());

    match cli.command {
        None => {
            debug!(command = "check", "dispatching default check");
            commands::check::run(cli.check)
        }
        Some(Commands::Check(args)) => {
            debug!(command = "check", "dispatching");
            commands::check::run(args)
        }
        Some(Commands::Registry(args)) => {
            debug!(command = "registry", "dispatching");
            commands::registry::run(args)
        }
        Some(Commands::Evidence(args)) => {
            debug!(command = "evidence", "dispatching");
            commands::evidence::run(args)
        }
    }
}
