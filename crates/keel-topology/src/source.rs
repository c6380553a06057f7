// Topology sources
// Provides the load paths a bootstrap can choose from: static snapshot,
// dynamic (live) snapshot and XML cluster definition.

use std::path::{Path, PathBuf};

use tracing::debug;

use keel_common::{BIN_DIR, DYNAMIC_CONFIG_FILE, STATIC_CONFIG_FILE};

use crate::error::TopologyError;
use crate::model::ClusterTopology;
use crate::xml::parse_cluster_xml;

/// Trait for topology load strategies
pub trait TopologySource {
    /// Load the static topology snapshot installed for `user`
    fn load_static(&self, user: &str) -> Result<ClusterTopology, TopologyError>;

    /// Whether a previously persisted live snapshot exists for `user`
    fn dynamic_snapshot_exists(&self, user: &str) -> bool;

    /// Load the previously persisted live snapshot for `user`
    fn load_dynamic(&self, user: &str) -> Result<ClusterTopology, TopologyError>;

    /// Load an XML cluster definition
    fn load_xml(&self, path: &Path) -> Result<ClusterTopology, TopologyError>;
}

/// File-based topology source
/// Reads snapshots from `<home>/bin/` and XML definitions from any path
#[derive(Clone, Debug)]
pub struct FileTopologySource {
    home: PathBuf,
}

impl FileTopologySource {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn static_config_path(&self) -> PathBuf {
        self.home.join(BIN_DIR).join(STATIC_CONFIG_FILE)
    }

    pub fn dynamic_config_path(&self) -> PathBuf {
        self.home.join(BIN_DIR).join(DYNAMIC_CONFIG_FILE)
    }

    fn read_file(path: &Path) -> Result<String, TopologyError> {
        if !path.exists() {
            return Err(TopologyError::FileNotFound(path.to_path_buf()));
        }
        std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_snapshot(path: &Path) -> Result<ClusterTopology, TopologyError> {
        let text = Self::read_file(path)?;
        serde_json::from_str(&text).map_err(|e| TopologyError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl TopologySource for FileTopologySource {
    fn load_static(&self, user: &str) -> Result<ClusterTopology, TopologyError> {
        let path = self.static_config_path();
        debug!(user, path = %path.display(), "Loading static topology snapshot");
        Self::read_snapshot(&path)
    }

    fn dynamic_snapshot_exists(&self, _user: &str) -> bool {
        self.dynamic_config_path().is_file()
    }

    fn load_dynamic(&self, user: &str) -> Result<ClusterTopology, TopologyError> {
        let path = self.dynamic_config_path();
        debug!(user, path = %path.display(), "Loading dynamic topology snapshot");
        Self::read_snapshot(&path)
    }

    fn load_xml(&self, path: &Path) -> Result<ClusterTopology, TopologyError> {
        debug!(path = %path.display(), "Loading XML cluster definition");
        let text = Self::read_file(path)?;
        parse_cluster_xml(&text, path)
    }
}
