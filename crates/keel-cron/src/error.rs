use std::path::PathBuf;

use keel_common::{ErrorCode, ErrorKind, error};

/// Errors raised by the scheduling helpers
#[derive(thiserror::Error, Debug)]
pub enum CronError {
    #[error("failed to obtain crontab list. Error: {output}. The cmd is {command}")]
    ListFailed { command: String, output: String },

    #[error("failed to execute the command: {command}. Error:\n{output}")]
    CommandFailed { command: String, output: String },

    #[error("file '{}' does not exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("pid lock file '{}' is held by another process", .0.display())]
    LockHeld(PathBuf),

    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to detach process: {0}")]
    Detach(#[from] nix::Error),
}

impl CronError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CronError::ListFailed { .. } | CronError::CommandFailed { .. } => {
                ErrorKind::ExternalCommand
            }
            CronError::FileNotFound(_) => ErrorKind::Configuration,
            CronError::Spawn { .. } => ErrorKind::ExternalCommand,
            CronError::LockHeld(_) | CronError::Io { .. } | CronError::Detach(_) => {
                ErrorKind::Filesystem
            }
        }
    }

    pub fn code(&self) -> ErrorCode<'static> {
        match self {
            CronError::ListFailed { .. } => error::CRONTAB_LIST_FAILED,
            CronError::CommandFailed { .. } | CronError::Spawn { .. } => error::COMMAND_FAILED,
            CronError::FileNotFound(_) => error::FILE_NOT_FOUND,
            CronError::LockHeld(_) => error::LOCK_HELD,
            CronError::Io { .. } | CronError::Detach(_) => error::FILESYSTEM_ERROR,
        }
    }
}
