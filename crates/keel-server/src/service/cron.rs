//! `keel cron`: crontab management and periodic commands

use std::io::Write;
use std::path::Path;

use tracing::info;

use keel_cron::{CommandRunner, Crontab, spawn_periodic};

use crate::model::CronCommand;

pub fn run_cron(command: &CronCommand) -> anyhow::Result<()> {
    handle(&Crontab::new(), command, &mut std::io::stdout().lock())
}

/// Handle the crontab subcommands, writing their report to `out`
pub fn handle<R: CommandRunner>(
    crontab: &Crontab<R>,
    command: &CronCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        CronCommand::List => {
            let jobs = crontab.list()?;
            if !jobs.is_empty() {
                writeln!(out, "{}", jobs)?;
            }
        }
        CronCommand::Install { path } => {
            crontab.install(path)?;
            info!(path = %path.display(), "Installed crontab");
        }
        CronCommand::Check => {
            if !crontab.has_permission() {
                anyhow::bail!("crontab not permitted for the current user");
            }
            writeln!(out, "permitted")?;
        }
        CronCommand::Run { pid_file, command } => run_periodic(pid_file, command)?,
    }
    Ok(())
}

fn run_periodic(pid_file: &Path, command: &str) -> anyhow::Result<()> {
    info!(command, pid_file = %pid_file.display(), "Detaching periodic command");
    spawn_periodic(command, pid_file)?;
    Ok(())
}
