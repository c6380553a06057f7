//! Error taxonomy and error codes for Keel
//!
//! This module defines:
//! - `ErrorKind`: the three classes every Keel error falls into
//! - `ErrorCode`: Structured error codes reported alongside fatal messages

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Classes of failure shared by every Keel crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Required file or path absent, local node not found, ownership empty
    Configuration,
    /// A shell-level command exited non-zero for an unexpected reason
    ExternalCommand,
    /// Symlink resolution or ownership lookup failed
    Filesystem,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::ExternalCommand => "external-command",
            ErrorKind::Filesystem => "filesystem",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error code structure for fatal messages
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

impl Display for ErrorCode<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[KEEL-{}] {}", self.code, self.message)
    }
}

// Configuration errors
pub const FILE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 50201,
    message: "required file does not exist",
};

pub const CONFIG_PARSE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 50202,
    message: "failed to parse configuration file",
};

pub const XML_PATH_MISSING: ErrorCode<'static> = ErrorCode {
    code: 50203,
    message: "XML configuration file was not supplied",
};

pub const NODE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 51619,
    message: "local host is not a node of the cluster",
};

pub const OWNERSHIP_UNKNOWN: ErrorCode<'static> = ErrorCode {
    code: 50308,
    message: "failed to determine the owner of the install path",
};

pub const PEER_RESOLUTION_ERROR: ErrorCode<'static> = ErrorCode {
    code: 51620,
    message: "failed to resolve peer instances",
};

pub const DESCRIPTOR_INCOMPLETE: ErrorCode<'static> = ErrorCode {
    code: 51621,
    message: "instance descriptor is missing a required field",
};

pub const BOOTSTRAP_SPENT: ErrorCode<'static> = ErrorCode {
    code: 51622,
    message: "bootstrap has already run",
};

// External command errors
pub const COMMAND_FAILED: ErrorCode<'static> = ErrorCode {
    code: 51400,
    message: "failed to execute command",
};

pub const CRONTAB_LIST_FAILED: ErrorCode<'static> = ErrorCode {
    code: 50219,
    message: "failed to obtain crontab list",
};

// Filesystem errors
pub const FILESYSTEM_ERROR: ErrorCode<'static> = ErrorCode {
    code: 50200,
    message: "filesystem operation failed",
};

pub const LOCK_HELD: ErrorCode<'static> = ErrorCode {
    code: 50206,
    message: "pid lock file is held by another process",
};
