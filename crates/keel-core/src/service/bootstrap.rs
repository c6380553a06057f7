// Local bootstrap orchestrator
// Loads the topology, locates this host, builds the component graph and
// resolves the install owner. Every step returns a typed error; only
// `bootstrap_or_exit` turns an error into process termination.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, error, info};

use keel_common::BootstrapIntent;
use keel_topology::{
    ClusterTopology, FileTopologySource, HostIdentity, NodeInfo, SystemHost, TopologySource,
    locate_local_node,
};

use crate::error::BootstrapError;
use crate::model::{
    ComponentSettings, DisasterRecoveryConfig, LogSink, ModeFlags, Ownership,
    StorageEngineSettings,
};
use crate::service::factory::{ComponentFactory, ComponentGraph};
use crate::service::ownership::{FsOwnership, OwnershipProbe, resolve_owner};
use crate::version::VersionInfo;

/// Where the topology of a run comes from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Static snapshot, or the dynamic snapshot when the intent allows it
    #[default]
    Snapshot,
    /// XML cluster definition; `None` means XML was requested without a path
    Xml(Option<PathBuf>),
}

/// Which load path populated the topology
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopologyOrigin {
    Static,
    Dynamic,
    Xml,
}

impl Display for TopologyOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TopologyOrigin::Static => "static",
            TopologyOrigin::Dynamic => "dynamic",
            TopologyOrigin::Xml => "xml",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapState {
    Unloaded,
    Loaded(TopologyOrigin),
    Ready,
    Failed,
}

/// Orchestrator-wide options fixed at construction
#[derive(Clone, Debug, Default)]
pub struct BootstrapOptions {
    pub intent: BootstrapIntent,
    /// OS user whose installation is bootstrapped
    pub user: String,
    pub config_source: ConfigSource,
    pub modes: ModeFlags,
    pub shared_storage_config: String,
    pub storage: StorageEngineSettings,
}

impl BootstrapOptions {
    pub fn new(intent: BootstrapIntent, user: impl Into<String>) -> Self {
        Self {
            intent,
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn with_xml(mut self, path: Option<PathBuf>) -> Self {
        self.config_source = ConfigSource::Xml(path);
        self
    }

    pub fn with_modes(mut self, alternate_backend: bool, shared_storage: bool) -> Self {
        self.modes = ModeFlags {
            alternate_backend,
            shared_storage,
        };
        self
    }

    pub fn with_shared_storage_config(mut self, config: impl Into<String>) -> Self {
        self.shared_storage_config = config.into();
        self
    }

    pub fn with_consensus_mode(mut self, enabled: bool) -> Self {
        self.storage.consensus_mode = enabled;
        self
    }

    pub fn with_init_params(mut self, params: Vec<String>) -> Self {
        self.storage.init_params = params;
        self
    }

    pub fn with_disaster_recovery(mut self, config: DisasterRecoveryConfig) -> Self {
        self.storage.disaster_recovery = config;
        self
    }
}

/// External collaborators of a bootstrap run
pub struct BootstrapEnv {
    pub source: Box<dyn TopologySource>,
    pub host: Box<dyn HostIdentity>,
    pub owner_probe: Box<dyn OwnershipProbe>,
    pub version: VersionInfo,
}

impl BootstrapEnv {
    /// Collaborators backed by the local filesystem and operating system
    pub fn system(home: impl Into<PathBuf>) -> Self {
        Self {
            source: Box::new(FileTopologySource::new(home)),
            host: Box::new(SystemHost),
            owner_probe: Box::new(FsOwnership),
            version: VersionInfo::current(),
        }
    }
}

/// Result of a successful bootstrap, handed to process-control tooling
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalCluster {
    pub origin: TopologyOrigin,
    pub topology: ClusterTopology,
    pub local_node: NodeInfo,
    pub components: ComponentGraph,
    /// Install owner; operations on the node run as this user
    pub owner: Ownership,
}

/// Local bootstrap orchestrator
pub struct LocalBootstrap {
    options: BootstrapOptions,
    env: BootstrapEnv,
    log: LogSink,
    state: BootstrapState,
}

impl LocalBootstrap {
    pub fn new(options: BootstrapOptions, env: BootstrapEnv) -> Self {
        let log = LogSink::new(options.intent.as_str());
        Self {
            options,
            env,
            log,
            state: BootstrapState::Unloaded,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    pub fn options(&self) -> &BootstrapOptions {
        &self.options
    }

    /// Run every bootstrap step. On error the orchestrator stays `Failed`.
    ///
    /// An orchestrator runs once: any later call returns
    /// [`BootstrapError::AlreadyRun`] without touching the topology source.
    pub fn run(&mut self) -> Result<LocalCluster, BootstrapError> {
        if self.state != BootstrapState::Unloaded {
            return Err(BootstrapError::AlreadyRun(self.state));
        }
        let _entered = self.log.span().entered();
        match self.try_run() {
            Ok(cluster) => {
                self.state = BootstrapState::Ready;
                Ok(cluster)
            }
            Err(e) => {
                self.state = BootstrapState::Failed;
                Err(e)
            }
        }
    }

    fn try_run(&mut self) -> Result<LocalCluster, BootstrapError> {
        let (topology, origin) = self.load_topology()?;
        self.state = BootstrapState::Loaded(origin);

        let local_node = self.locate(&topology)?;
        self.log.debug(&format!(
            "Instance information on local node:\n{}",
            local_node
        ));

        let components = self.build_components(&topology, &local_node)?;
        let owner = resolve_owner(
            self.env.owner_probe.as_ref(),
            &topology.app_path,
            &self.env.version.commit_id,
        )?;
        // Operations on the node run as the install owner from here on
        self.options.user = owner.user.clone();

        info!(
            node = %local_node.name,
            origin = %origin,
            components = components.len(),
            owner = %owner,
            "Local node bootstrap complete"
        );

        Ok(LocalCluster {
            origin,
            topology,
            local_node,
            components,
            owner,
        })
    }

    fn load_topology(&self) -> Result<(ClusterTopology, TopologyOrigin), BootstrapError> {
        let source = self.env.source.as_ref();
        match &self.options.config_source {
            ConfigSource::Xml(None) => Err(BootstrapError::XmlPathMissing),
            ConfigSource::Xml(Some(path)) => Ok((source.load_xml(path)?, TopologyOrigin::Xml)),
            ConfigSource::Snapshot => {
                let user = self.options.user.as_str();
                let prefer_dynamic = !self.options.modes.shared_storage
                    && self.options.intent.prefers_dynamic_snapshot()
                    && source.dynamic_snapshot_exists(user);
                if prefer_dynamic {
                    Ok((source.load_dynamic(user)?, TopologyOrigin::Dynamic))
                } else {
                    Ok((source.load_static(user)?, TopologyOrigin::Static))
                }
            }
        }
    }

    fn locate(&self, topology: &ClusterTopology) -> Result<NodeInfo, BootstrapError> {
        let host = self.env.host.current_host();
        debug!(host = %host, cluster = %topology.name, "Locating local node");
        locate_local_node(topology, &host)
            .cloned()
            .ok_or_else(|| BootstrapError::NodeNotFound {
                host,
                cluster: topology.name.clone(),
            })
    }

    fn build_components(
        &self,
        topology: &ClusterTopology,
        local_node: &NodeInfo,
    ) -> Result<ComponentGraph, BootstrapError> {
        let settings = ComponentSettings::new(
            topology.cluster_type,
            topology.bin_path(),
            self.log.clone(),
            self.options.modes,
            self.options.shared_storage_config.clone(),
        );
        let factory = ComponentFactory::new(topology, settings, self.options.storage.clone());
        Ok(factory.build(local_node)?)
    }
}

/// Run `bootstrap`, terminating the process on any error.
///
/// The error is logged with its kind, code and context before exiting.
/// No partial component graph is ever returned.
pub fn bootstrap_or_exit(bootstrap: &mut LocalBootstrap) -> LocalCluster {
    match bootstrap.run() {
        Ok(cluster) => cluster,
        Err(e) => {
            error!(
                kind = %e.kind(),
                code = %e.code(),
                step = %bootstrap.log().step,
                "{}",
                e
            );
            eprintln!("{} {}", e.code(), e);
            std::process::exit(1);
        }
    }
}
