use std::path::PathBuf;

use keel_common::{ErrorCode, ErrorKind, error};
use keel_topology::TopologyError;

use crate::service::bootstrap::BootstrapState;

/// Errors raised anywhere on the bootstrap path
///
/// None of these reach callers of [`crate::bootstrap_or_exit`]; they are
/// logged there and end the process.
#[derive(thiserror::Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("XML configuration file was not supplied")]
    XmlPathMissing,

    #[error("bootstrap already ran (state {0:?}); create a new orchestrator")]
    AlreadyRun(BootstrapState),

    #[error("host '{host}' is not a node of cluster '{cluster}'")]
    NodeNotFound { host: String, cluster: String },

    #[error("failed to determine the owner of install path '{}'", .0.display())]
    OwnershipUnknown(PathBuf),

    #[error("failed to resolve '{}': {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to look up owner of '{}': {source}", path.display())]
    OwnerLookup {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
}

impl BootstrapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootstrapError::Topology(e) => e.kind(),
            BootstrapError::Filesystem { .. } | BootstrapError::OwnerLookup { .. } => {
                ErrorKind::Filesystem
            }
            _ => ErrorKind::Configuration,
        }
    }

    pub fn code(&self) -> ErrorCode<'static> {
        match self {
            BootstrapError::Topology(e) => e.code(),
            BootstrapError::XmlPathMissing => error::XML_PATH_MISSING,
            BootstrapError::AlreadyRun(_) => error::BOOTSTRAP_SPENT,
            BootstrapError::NodeNotFound { .. } => error::NODE_NOT_FOUND,
            BootstrapError::OwnershipUnknown(_) => error::OWNERSHIP_UNKNOWN,
            BootstrapError::Filesystem { .. } | BootstrapError::OwnerLookup { .. } => {
                error::FILESYSTEM_ERROR
            }
        }
    }
}
