// Cluster topology data model
// A topology is loaded once per bootstrap and treated as read-only afterwards.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

/// Mirror id of an instance that does not belong to any replication group
pub const UNASSIGNED_MIRROR_ID: i32 = -1;

/// Deployment shape of the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterType {
    Single,
    SinglePrimaryMultiStandby,
    #[default]
    SingleInst,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterType::Single => "single",
            ClusterType::SinglePrimaryMultiStandby => "single-primary-multi-standby",
            ClusterType::SingleInst => "single-inst",
        }
    }
}

impl Display for ClusterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClusterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(ClusterType::Single),
            "single-primary-multi-standby" => Ok(ClusterType::SinglePrimaryMultiStandby),
            "single-inst" => Ok(ClusterType::SingleInst),
            _ => Err(format!("Invalid cluster type: {}", s)),
        }
    }
}

/// Service role an instance plays on its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceRole {
    /// Cluster coordination / arbitration server
    Coordinator,
    /// Per-node coordination agent
    Agent,
    /// Storage engine (data node)
    Storage,
    /// Shared-storage layer unit
    SharedStorage,
}

impl InstanceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceRole::Coordinator => "coordinator",
            InstanceRole::Agent => "agent",
            InstanceRole::Storage => "storage",
            InstanceRole::SharedStorage => "shared-storage",
        }
    }
}

impl Display for InstanceRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Replication position of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceType {
    #[default]
    Primary,
    Standby,
    CascadeStandby,
}

impl std::str::FromStr for InstanceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(InstanceType::Primary),
            "standby" => Ok(InstanceType::Standby),
            "cascade-standby" => Ok(InstanceType::CascadeStandby),
            _ => Err(format!("Invalid instance type: {}", s)),
        }
    }
}

/// Per-instance descriptor: identity, ports and data directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    pub instance_id: u32,
    #[serde(default = "InstanceDescriptor::default_mirror_id")]
    pub mirror_id: i32,
    pub role: InstanceRole,
    pub host_name: String,
    #[serde(default)]
    pub listen_ips: Vec<String>,
    pub port: u16,
    #[serde(default)]
    pub ha_port: Option<u16>,
    pub data_dir: PathBuf,
    #[serde(default)]
    pub instance_type: InstanceType,
}

impl InstanceDescriptor {
    fn default_mirror_id() -> i32 {
        UNASSIGNED_MIRROR_ID
    }

    /// Check the fields every process driver relies on.
    ///
    /// Reports the first missing field.
    pub fn require_complete(&self) -> Result<(), TopologyError> {
        let missing = if self.host_name.trim().is_empty() {
            Some("host_name")
        } else if self.port == 0 {
            Some("port")
        } else if self.data_dir.as_os_str().is_empty() {
            Some("data_dir")
        } else {
            None
        };

        match missing {
            Some(field) => Err(TopologyError::IncompleteDescriptor {
                instance_id: self.instance_id,
                field,
            }),
            None => Ok(()),
        }
    }
}

impl Display for InstanceDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (mirror {}) port {} data {}",
            self.role,
            self.instance_id,
            self.mirror_id,
            self.port,
            self.data_dir.display()
        )
    }
}

/// Instances declared to run on one node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    #[serde(default)]
    pub coordinators: Vec<InstanceDescriptor>,
    #[serde(default)]
    pub agents: Vec<InstanceDescriptor>,
    #[serde(default)]
    pub storage_engines: Vec<InstanceDescriptor>,
    #[serde(default)]
    pub shared_storage: Vec<InstanceDescriptor>,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn instance_count(&self) -> usize {
        self.coordinators.len()
            + self.agents.len()
            + self.storage_engines.len()
            + self.shared_storage.len()
    }
}

impl Display for NodeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "node {}:", self.name)?;
        let groups = [
            &self.coordinators,
            &self.agents,
            &self.storage_engines,
            &self.shared_storage,
        ];
        for instance in groups.into_iter().flatten() {
            writeln!(f, "  {}", instance)?;
        }
        Ok(())
    }
}

/// The declared cluster: every node, every instance, and the shared install path
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    pub name: String,
    #[serde(default)]
    pub cluster_type: ClusterType,
    pub app_path: PathBuf,
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
}

impl ClusterTopology {
    /// Find the node declared under exactly `name`.
    ///
    /// Matching is case-sensitive and never partial.
    pub fn node_by_name(&self, name: &str) -> Option<&NodeInfo> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// `<app_path>/bin`
    pub fn bin_path(&self) -> PathBuf {
        self.app_path.join(keel_common::BIN_DIR)
    }

    /// Every storage-engine instance of the cluster, across all nodes
    pub fn storage_instances(&self) -> impl Iterator<Item = &InstanceDescriptor> {
        self.nodes.iter().flat_map(|node| node.storage_engines.iter())
    }

    /// Instances replicating with `instance`: same mirror group, different id.
    ///
    /// Peers may live on any node of the cluster.
    pub fn peer_instances(
        &self,
        instance: &InstanceDescriptor,
    ) -> Result<Vec<InstanceDescriptor>, TopologyError> {
        if instance.mirror_id < 0 {
            return Err(TopologyError::PeerResolution {
                instance_id: instance.instance_id,
                reason: "mirror id is unassigned".to_string(),
            });
        }

        let mut declared = false;
        let mut peers = Vec::new();
        for candidate in self.storage_instances() {
            if candidate.mirror_id != instance.mirror_id {
                continue;
            }
            if candidate.instance_id == instance.instance_id {
                declared = true;
            } else {
                peers.push(candidate.clone());
            }
        }

        if !declared {
            return Err(TopologyError::PeerResolution {
                instance_id: instance.instance_id,
                reason: format!(
                    "instance is not declared in mirror group {} of cluster '{}'",
                    instance.mirror_id, self.name
                ),
            });
        }

        Ok(peers)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn storage(id: u32, mirror: i32, host: &str) -> InstanceDescriptor {
        InstanceDescriptor {
            instance_id: id,
            mirror_id: mirror,
            role: InstanceRole::Storage,
            host_name: host.to_string(),
            listen_ips: vec![],
            port: 15400,
            ha_port: None,
            data_dir: PathBuf::from(format!("/data/dn{}", id)),
            instance_type: InstanceType::Primary,
        }
    }

    fn three_node_topology() -> ClusterTopology {
        let mut a = NodeInfo::new("node-a");
        a.storage_engines = vec![storage(6001, 1, "node-a"), storage(6004, 2, "node-a")];
        let mut b = NodeInfo::new("node-b");
        b.storage_engines = vec![storage(6002, 1, "node-b")];
        let mut c = NodeInfo::new("node-c");
        c.storage_engines = vec![storage(6003, 1, "node-c")];
        ClusterTopology {
            name: "c1".to_string(),
            cluster_type: ClusterType::SinglePrimaryMultiStandby,
            app_path: PathBuf::from("/opt/keel/app"),
            nodes: vec![a, b, c],
        }
    }

    #[test]
    fn test_cluster_type_round_trip() {
        for t in [
            ClusterType::Single,
            ClusterType::SinglePrimaryMultiStandby,
            ClusterType::SingleInst,
        ] {
            assert_eq!(t.as_str().parse::<ClusterType>().unwrap(), t);
        }
        assert!("multi".parse::<ClusterType>().is_err());
    }

    #[test]
    fn test_node_by_name_exact() {
        let topology = three_node_topology();
        assert_eq!(topology.node_by_name("node-b").unwrap().name, "node-b");
        assert!(topology.node_by_name("node").is_none());
        assert!(topology.node_by_name("NODE-B").is_none());
        assert!(topology.node_by_name("node-b.example.com").is_none());
    }

    #[test]
    fn test_bin_path() {
        let topology = three_node_topology();
        assert_eq!(topology.bin_path(), PathBuf::from("/opt/keel/app/bin"));
    }

    #[test]
    fn test_peer_instances_cross_nodes() {
        let topology = three_node_topology();
        let peers = topology
            .peer_instances(&storage(6001, 1, "node-a"))
            .unwrap();
        let ids: Vec<u32> = peers.iter().map(|p| p.instance_id).collect();
        assert_eq!(ids, vec![6002, 6003]);
    }

    #[test]
    fn test_peer_instances_single_member_group() {
        let topology = three_node_topology();
        let peers = topology
            .peer_instances(&storage(6004, 2, "node-a"))
            .unwrap();
        assert!(peers.is_empty());
    }

    #[test]
    fn test_peer_instances_unassigned_mirror() {
        let topology = three_node_topology();
        let err = topology
            .peer_instances(&storage(6001, UNASSIGNED_MIRROR_ID, "node-a"))
            .unwrap_err();
        assert!(matches!(
            err,
            TopologyError::PeerResolution {
                instance_id: 6001,
                ..
            }
        ));
    }

    #[test]
    fn test_peer_instances_undeclared_instance() {
        let topology = three_node_topology();
        let err = topology
            .peer_instances(&storage(7001, 1, "node-z"))
            .unwrap_err();
        assert!(err.to_string().contains("not declared"));
    }

    #[test]
    fn test_require_complete() {
        let mut inst = storage(6001, 1, "node-a");
        assert!(inst.require_complete().is_ok());

        inst.port = 0;
        let err = inst.require_complete().unwrap_err();
        assert!(matches!(
            err,
            TopologyError::IncompleteDescriptor { field: "port", .. }
        ));

        inst.port = 15400;
        inst.data_dir = PathBuf::new();
        let err = inst.require_complete().unwrap_err();
        assert!(matches!(
            err,
            TopologyError::IncompleteDescriptor {
                field: "data_dir",
                ..
            }
        ));
    }

    #[test]
    fn test_descriptor_json_defaults() {
        let json = r#"{
            "instance_id": 5001,
            "role": "coordinator",
            "host_name": "node-a",
            "port": 15300,
            "data_dir": "/data/cm"
        }"#;
        let inst: InstanceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(inst.mirror_id, UNASSIGNED_MIRROR_ID);
        assert_eq!(inst.instance_type, InstanceType::Primary);
        assert!(inst.listen_ips.is_empty());
        assert_eq!(inst.ha_port, None);
    }

    #[test]
    fn test_node_display_lists_instances() {
        let topology = three_node_topology();
        let text = topology.node_by_name("node-a").unwrap().to_string();
        assert!(text.starts_with("node node-a:"));
        assert!(text.contains("storage 6001"));
        assert!(text.contains("storage 6004"));
    }
}
