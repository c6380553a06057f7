// Component factory
// Materializes one component per instance declared on the local node and
// stamps each with the orchestrator-wide settings.

use serde::Serialize;
use tracing::debug;

use keel_topology::{ClusterTopology, NodeInfo, TopologyError};

use crate::model::{
    Component, ComponentSettings, Coordinator, SharedStorage, StorageEngine,
    StorageEngineSettings,
};

/// Components of the local node, grouped by variant
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComponentGraph {
    pub coordinators: Vec<Coordinator>,
    pub storage_engines: Vec<StorageEngine>,
    pub shared_storage: Vec<SharedStorage>,
}

impl ComponentGraph {
    pub fn len(&self) -> usize {
        self.coordinators.len() + self.storage_engines.len() + self.shared_storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every component in construction order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Component> {
        self.coordinators
            .iter()
            .map(|c| c as &dyn Component)
            .chain(self.storage_engines.iter().map(|c| c as &dyn Component))
            .chain(self.shared_storage.iter().map(|c| c as &dyn Component))
    }
}

/// Builds the component graph of one node against the full cluster topology
pub struct ComponentFactory<'a> {
    topology: &'a ClusterTopology,
    settings: ComponentSettings,
    storage: StorageEngineSettings,
}

impl<'a> ComponentFactory<'a> {
    pub fn new(
        topology: &'a ClusterTopology,
        settings: ComponentSettings,
        storage: StorageEngineSettings,
    ) -> Self {
        Self {
            topology,
            settings,
            storage,
        }
    }

    pub fn settings(&self) -> &ComponentSettings {
        &self.settings
    }

    /// Build every component of `node`.
    ///
    /// Any incomplete descriptor or unresolvable peer set aborts the whole pass.
    pub fn build(&self, node: &NodeInfo) -> Result<ComponentGraph, TopologyError> {
        let mut graph = ComponentGraph::default();

        for inst in node.coordinators.iter().chain(node.agents.iter()) {
            inst.require_complete()?;
            graph
                .coordinators
                .push(Coordinator::new(&self.settings, inst.clone()));
        }

        for inst in &node.storage_engines {
            inst.require_complete()?;
            let peers = self.topology.peer_instances(inst)?;
            debug!(
                instance_id = inst.instance_id,
                peers = peers.len(),
                "Resolved storage engine peers"
            );
            graph.storage_engines.push(StorageEngine::new(
                &self.settings,
                &self.storage,
                inst.clone(),
                peers,
            ));
        }

        if self.settings.modes.shared_storage {
            for inst in &node.storage_engines {
                graph
                    .shared_storage
                    .push(SharedStorage::new(&self.settings, inst.instance_id));
            }
        }

        debug!(
            node = %node.name,
            coordinators = graph.coordinators.len(),
            storage_engines = graph.storage_engines.len(),
            shared_storage = graph.shared_storage.len(),
            "Built local component graph"
        );

        Ok(graph)
    }
}
