//! Local node lookup
//!
//! Finds the node of a loaded topology that corresponds to the current host.
//! Lookup is exact: no fuzzy matching and no partial host name resolution.

use crate::model::{ClusterTopology, NodeInfo};

/// Source of the name this host is declared under
pub trait HostIdentity {
    fn current_host(&self) -> String;
}

/// Host identity backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostIdentity for SystemHost {
    fn current_host(&self) -> String {
        keel_common::host_name_or_ip()
    }
}

impl HostIdentity for String {
    fn current_host(&self) -> String {
        self.clone()
    }
}

impl HostIdentity for &str {
    fn current_host(&self) -> String {
        (*self).to_string()
    }
}

/// Return the node declared under `host`, or `None` when the host is not part
/// of the cluster.
pub fn locate_local_node<'a>(topology: &'a ClusterTopology, host: &str) -> Option<&'a NodeInfo> {
    topology.node_by_name(host)
}
