// XML cluster definition documents
//
// <cluster name="c1" type="single-inst" app-path="/opt/keel/app">
//   <node name="node-a">
//     <coordinator id="5001" port="15300" data-dir="/data/cm"/>
//     <agent id="5101" port="15301" data-dir="/data/cma"/>
//     <storage id="6001" mirror="1" port="15400" ha-port="15401"
//              data-dir="/data/dn1" listen-ips="10.0.0.1,10.0.0.2" type="primary"/>
//     <shared-storage id="7001" port="15500" data-dir="/data/dss"/>
//   </node>
// </cluster>
//
// `mirror` is required on <storage>: peer resolution groups engines by it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::TopologyError;
use crate::model::{
    ClusterTopology, ClusterType, InstanceDescriptor, InstanceRole, InstanceType, NodeInfo,
    UNASSIGNED_MIRROR_ID,
};

#[derive(Debug, Deserialize)]
#[serde(rename = "cluster")]
struct XmlCluster {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@type", default)]
    cluster_type: Option<String>,
    #[serde(rename = "@app-path")]
    app_path: String,
    #[serde(rename = "node", default)]
    nodes: Vec<XmlNode>,
}

#[derive(Debug, Deserialize)]
struct XmlNode {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "coordinator", default)]
    coordinators: Vec<XmlInstance>,
    #[serde(rename = "agent", default)]
    agents: Vec<XmlInstance>,
    #[serde(rename = "storage", default)]
    storage_engines: Vec<XmlInstance>,
    #[serde(rename = "shared-storage", default)]
    shared_storage: Vec<XmlInstance>,
}

#[derive(Debug, Deserialize)]
struct XmlInstance {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@mirror", default)]
    mirror: Option<i32>,
    #[serde(rename = "@port")]
    port: u16,
    #[serde(rename = "@ha-port", default)]
    ha_port: Option<u16>,
    #[serde(rename = "@data-dir")]
    data_dir: String,
    #[serde(rename = "@listen-ips", default)]
    listen_ips: Option<String>,
    #[serde(rename = "@type", default)]
    instance_type: Option<String>,
}

/// Parse an XML cluster definition into a topology
pub(crate) fn parse_cluster_xml(text: &str, path: &Path) -> Result<ClusterTopology, TopologyError> {
    let parse_error = |message: String| TopologyError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let doc: XmlCluster = quick_xml::de::from_str(text).map_err(|e| parse_error(e.to_string()))?;

    let cluster_type = match doc.cluster_type.as_deref() {
        Some(value) => value.parse::<ClusterType>().map_err(parse_error)?,
        None => ClusterType::default(),
    };

    let mut nodes = Vec::with_capacity(doc.nodes.len());
    for node in doc.nodes {
        let convert = |instances: Vec<XmlInstance>, role: InstanceRole| {
            instances
                .into_iter()
                .map(|inst| inst.into_descriptor(&node.name, role))
                .collect::<Result<Vec<_>, String>>()
        };
        nodes.push(NodeInfo {
            coordinators: convert(node.coordinators, InstanceRole::Coordinator)
                .map_err(parse_error)?,
            agents: convert(node.agents, InstanceRole::Agent).map_err(parse_error)?,
            storage_engines: convert(node.storage_engines, InstanceRole::Storage)
                .map_err(parse_error)?,
            shared_storage: convert(node.shared_storage, InstanceRole::SharedStorage)
                .map_err(parse_error)?,
            name: node.name,
        });
    }

    Ok(ClusterTopology {
        name: doc.name,
        cluster_type,
        app_path: PathBuf::from(doc.app_path),
        nodes,
    })
}

impl XmlInstance {
    fn into_descriptor(
        self,
        host_name: &str,
        role: InstanceRole,
    ) -> Result<InstanceDescriptor, String> {
        let instance_type = match self.instance_type.as_deref() {
            Some(value) => value.parse::<InstanceType>()?,
            None => InstanceType::default(),
        };
        let listen_ips = self
            .listen_ips
            .map(|ips| {
                ips.split(',')
                    .map(|ip| ip.trim().to_string())
                    .filter(|ip| !ip.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let mirror_id = match (role, self.mirror) {
            (InstanceRole::Storage, Some(mirror)) if mirror >= 0 => mirror,
            (InstanceRole::Storage, _) => {
                return Err(format!(
                    "storage instance {} on node '{}' needs a non-negative mirror attribute",
                    self.id, host_name
                ));
            }
            (_, mirror) => mirror.unwrap_or(UNASSIGNED_MIRROR_ID),
        };

        Ok(InstanceDescriptor {
            instance_id: self.id,
            mirror_id,
            role,
            host_name: host_name.to_string(),
            listen_ips,
            port: self.port,
            ha_port: self.ha_port,
            data_dir: PathBuf::from(self.data_dir),
            instance_type,
        })
    }
}
