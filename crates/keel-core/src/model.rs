// Component data model
// Components are value holders for one runnable service instance on the local
// node. They never own a process; drivers key process control off the
// instance descriptor.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{Span, debug, info_span};

use keel_topology::{ClusterType, InstanceDescriptor};

/// Logging sink shared by the orchestrator and every component it creates.
///
/// Events emitted through the sink carry the orchestrating step as a span field.
/// Which files receive them is decided by the installed subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogSink {
    pub step: String,
}

impl LogSink {
    pub fn new(step: impl Into<String>) -> Self {
        Self { step: step.into() }
    }

    pub fn span(&self) -> Span {
        info_span!("keel", step = %self.step)
    }

    pub fn debug(&self, message: &str) {
        let _entered = self.span().entered();
        debug!("{}", message);
    }
}

/// Orchestrator-wide operating modes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModeFlags {
    /// Alternate storage backend mode
    pub alternate_backend: bool,
    /// Storage engines rely on an external shared-storage layer
    pub shared_storage: bool,
}

/// Attributes every component inherits from the orchestrator at construction
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentSettings {
    pub cluster_type: ClusterType,
    pub bin_path: PathBuf,
    pub log: LogSink,
    pub modes: ModeFlags,
    /// Present only when shared-storage mode is enabled
    pub shared_storage_config: Option<String>,
}

impl ComponentSettings {
    pub fn new(
        cluster_type: ClusterType,
        bin_path: PathBuf,
        log: LogSink,
        modes: ModeFlags,
        shared_storage_config: String,
    ) -> Self {
        let shared_storage_config = modes.shared_storage.then_some(shared_storage_config);
        Self {
            cluster_type,
            bin_path,
            log,
            modes,
            shared_storage_config,
        }
    }
}

/// Secondary storage-replication endpoint and its operating mode.
///
/// Carried by every storage engine, even when empty, so drivers see one contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DisasterRecoveryConfig {
    pub endpoint_config: String,
    pub cluster_mode: String,
}

/// Storage-engine specific attributes shared by all storage engines of a run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StorageEngineSettings {
    pub consensus_mode: bool,
    pub init_params: Vec<String>,
    pub disaster_recovery: DisasterRecoveryConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Coordinator,
    StorageEngine,
    SharedStorage,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Coordinator => "coordinator",
            ComponentKind::StorageEngine => "storage-engine",
            ComponentKind::SharedStorage => "shared-storage",
        }
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Common view over every component variant
pub trait Component {
    fn kind(&self) -> ComponentKind;

    fn settings(&self) -> &ComponentSettings;

    /// Descriptor the process driver is keyed by
    fn instance(&self) -> Option<&InstanceDescriptor>;

    fn bin_path(&self) -> &PathBuf {
        &self.settings().bin_path
    }
}

/// Coordination server or agent
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Coordinator {
    pub settings: ComponentSettings,
    pub instance: InstanceDescriptor,
}

impl Coordinator {
    pub fn new(settings: &ComponentSettings, instance: InstanceDescriptor) -> Self {
        Self {
            settings: settings.clone(),
            instance,
        }
    }
}

impl Component for Coordinator {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Coordinator
    }

    fn settings(&self) -> &ComponentSettings {
        &self.settings
    }

    fn instance(&self) -> Option<&InstanceDescriptor> {
        Some(&self.instance)
    }
}

/// Storage engine (data node) with its replication peers
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StorageEngine {
    pub settings: ComponentSettings,
    pub instance: InstanceDescriptor,
    /// Instances replicating with this one, anywhere in the cluster
    pub peers: Vec<InstanceDescriptor>,
    pub consensus_mode: bool,
    pub init_params: Vec<String>,
    pub disaster_recovery: DisasterRecoveryConfig,
}

impl StorageEngine {
    pub fn new(
        settings: &ComponentSettings,
        storage: &StorageEngineSettings,
        instance: InstanceDescriptor,
        peers: Vec<InstanceDescriptor>,
    ) -> Self {
        Self {
            settings: settings.clone(),
            instance,
            peers,
            consensus_mode: storage.consensus_mode,
            init_params: storage.init_params.clone(),
            disaster_recovery: storage.disaster_recovery.clone(),
        }
    }
}

impl Component for StorageEngine {
    fn kind(&self) -> ComponentKind {
        ComponentKind::StorageEngine
    }

    fn settings(&self) -> &ComponentSettings {
        &self.settings
    }

    fn instance(&self) -> Option<&InstanceDescriptor> {
        Some(&self.instance)
    }
}

/// Shared-storage layer companion of one storage engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SharedStorage {
    pub settings: ComponentSettings,
    /// Instance id of the storage engine this unit accompanies
    pub companion_of: u32,
}

impl SharedStorage {
    pub fn new(settings: &ComponentSettings, companion_of: u32) -> Self {
        Self {
            settings: settings.clone(),
            companion_of,
        }
    }
}

impl Component for SharedStorage {
    fn kind(&self) -> ComponentKind {
        ComponentKind::SharedStorage
    }

    fn settings(&self) -> &ComponentSettings {
        &self.settings
    }

    fn instance(&self) -> Option<&InstanceDescriptor> {
        None
    }
}

/// (user, group) owning the installed binary tree
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Ownership {
    pub user: String,
    pub group: String,
}

impl Ownership {
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.group.is_empty()
    }
}

impl Display for Ownership {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.user, self.group)
    }
}
