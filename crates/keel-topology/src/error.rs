use std::path::PathBuf;

use keel_common::{ErrorCode, ErrorKind, error};

/// Errors raised while loading or querying a cluster topology
#[derive(thiserror::Error, Debug)]
pub enum TopologyError {
    #[error("file '{}' does not exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to resolve peers of instance {instance_id}: {reason}")]
    PeerResolution { instance_id: u32, reason: String },

    #[error("instance {instance_id} is missing required field '{field}'")]
    IncompleteDescriptor {
        instance_id: u32,
        field: &'static str,
    },
}

impl TopologyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TopologyError::Io { .. } => ErrorKind::Filesystem,
            _ => ErrorKind::Configuration,
        }
    }

    pub fn code(&self) -> ErrorCode<'static> {
        match self {
            TopologyError::FileNotFound(_) => error::FILE_NOT_FOUND,
            TopologyError::Io { .. } => error::FILESYSTEM_ERROR,
            TopologyError::Parse { .. } => error::CONFIG_PARSE_ERROR,
            TopologyError::PeerResolution { .. } => error::PEER_RESOLUTION_ERROR,
            TopologyError::IncompleteDescriptor { .. } => error::DESCRIPTOR_INCOMPLETE,
        }
    }
}
