//! Keel Common - Shared types and utilities
//!
//! This crate provides the foundational types used across all Keel components:
//! - Error taxonomy and error codes
//! - Host identity helpers
//! - Common constants

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{ErrorCode, ErrorKind};
pub use utils::{host_name_or_ip, local_ip};

/// Subdirectory of the install path holding binaries and topology snapshots
pub const BIN_DIR: &str = "bin";

/// Static topology snapshot file name, relative to [`BIN_DIR`]
pub const STATIC_CONFIG_FILE: &str = "cluster_static_config.json";

/// Dynamic (live) topology snapshot file name, relative to [`BIN_DIR`]
pub const DYNAMIC_CONFIG_FILE: &str = "cluster_dynamic_config.json";

/// Environment variable whose presence marks a shared-storage install
pub const SHARED_STORAGE_HOME_ENV: &str = "DSS_HOME";

/// What the caller intends to do with the bootstrapped node.
///
/// Only `Start` is allowed to prefer a previously persisted dynamic snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapIntent {
    Start,
    #[default]
    Inspect,
    Reconfigure,
}

impl BootstrapIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            BootstrapIntent::Start => "start",
            BootstrapIntent::Inspect => "inspect",
            BootstrapIntent::Reconfigure => "reconfigure",
        }
    }

    pub fn prefers_dynamic_snapshot(self) -> bool {
        matches!(self, BootstrapIntent::Start)
    }
}

impl std::fmt::Display for BootstrapIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BootstrapIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(BootstrapIntent::Start),
            "inspect" => Ok(BootstrapIntent::Inspect),
            "reconfigure" => Ok(BootstrapIntent::Reconfigure),
            _ => Err(format!("Invalid bootstrap intent: {}", s)),
        }
    }
}
