//! Main entry point for the keel binary.
//!
//! Parses the command line, layers the configuration, sets up logging and
//! dispatches to the subcommand handler.

use clap::Parser;

use keel_server::{
    model::{Cli, Commands, Configuration},
    service, startup,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let configuration = Configuration::new(&cli)?;

    startup::init_logging(&configuration.logging_config())?;

    match &cli.command {
        Commands::Local(args) => service::local::run_local(args, &configuration),
        Commands::Cron(command) => service::cron::run_cron(command),
    }
}
