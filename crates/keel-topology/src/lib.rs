//! Keel Topology - Cluster topology model and sources
//!
//! This crate provides:
//! - The immutable `ClusterTopology` record and its instance descriptors
//! - Topology sources (static/dynamic JSON snapshots, XML cluster definitions)
//! - Local node lookup by host name
//! - Peer instance resolution across the whole cluster

pub mod error;
pub mod locator;
pub mod model;
pub mod source;
mod xml;

pub use error::TopologyError;
pub use locator::{HostIdentity, SystemHost, locate_local_node};
pub use model::{
    ClusterTopology, ClusterType, InstanceDescriptor, InstanceRole, InstanceType, NodeInfo,
    UNASSIGNED_MIRROR_ID,
};
pub use source::{FileTopologySource, TopologySource};
