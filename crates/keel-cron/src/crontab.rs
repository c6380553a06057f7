// Crontab helpers
// Wraps the `crontab` command for the current user.

use std::path::Path;

use tracing::debug;

use crate::command::{CommandRunner, SystemRunner, display_command};
use crate::error::CronError;

const CRONTAB: &str = "crontab";
const LIST_ARGS: &[&str] = &["-l"];

/// Printed by `crontab -l` when the user has no jobs
const NO_CRONTAB_MARKER: &str = "no crontab for";
/// Printed by `crontab` when the user is denied access
const NOT_ALLOWED_MARKER: &str = "not allowed";

/// Crontab access for the current user
#[derive(Debug, Clone, Default)]
pub struct Crontab<R: CommandRunner = SystemRunner> {
    runner: R,
}

impl Crontab<SystemRunner> {
    pub fn new() -> Self {
        Self {
            runner: SystemRunner,
        }
    }
}

impl<R: CommandRunner> Crontab<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    /// List the current user's jobs.
    ///
    /// A user without any crontab gets an empty listing, not an error.
    pub fn list(&self) -> Result<String, CronError> {
        let command = display_command(CRONTAB, LIST_ARGS);
        let out = self
            .runner
            .run(CRONTAB, LIST_ARGS, None)
            .map_err(|source| CronError::Spawn {
                command: command.clone(),
                source,
            })?;

        if out.output.contains(NO_CRONTAB_MARKER) {
            debug!("No crontab defined for current user");
            return Ok(String::new());
        }
        if !out.success {
            return Err(CronError::ListFailed {
                command,
                output: out.output,
            });
        }
        Ok(out.output)
    }

    /// Install `path` as the current user's crontab.
    pub fn install(&self, path: &Path) -> Result<(), CronError> {
        if !path.exists() {
            return Err(CronError::FileNotFound(path.to_path_buf()));
        }
        let file_name = path
            .file_name()
            .map(|name| format!("./{}", name.to_string_lossy()))
            .ok_or_else(|| CronError::FileNotFound(path.to_path_buf()))?;
        let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());

        let args = [file_name.as_str()];
        let command = display_command(CRONTAB, &args);
        debug!(command = %command, "Installing crontab");
        let out = self
            .runner
            .run(CRONTAB, &args, dir)
            .map_err(|source| CronError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !out.success {
            return Err(CronError::CommandFailed {
                command,
                output: out.output,
            });
        }
        Ok(())
    }

    /// Whether the current user may use crontab.
    ///
    /// Only the permission-denial marker in the listing output counts; the exit
    /// status is ignored.
    pub fn has_permission(&self) -> bool {
        match self.runner.run(CRONTAB, LIST_ARGS, None) {
            Ok(out) => !out.output.contains(NOT_ALLOWED_MARKER),
            Err(_) => true,
        }
    }
}
