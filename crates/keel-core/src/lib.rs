//! Keel Core - Local node bootstrap
//!
//! This crate provides:
//! - Typed components for every service instance on the local node
//! - The component factory that stamps orchestrator-wide attributes on them
//! - Install path ownership resolution
//! - The local bootstrap orchestrator and its fail-fast boundary

pub mod error;
pub mod model;
pub mod service;
pub mod version;

pub use error::BootstrapError;
pub use model::{
    Component, ComponentKind, ComponentSettings, Coordinator, DisasterRecoveryConfig, LogSink,
    ModeFlags, Ownership, SharedStorage, StorageEngine, StorageEngineSettings,
};
pub use service::{
    bootstrap::{
        BootstrapEnv, BootstrapOptions, BootstrapState, ConfigSource, LocalBootstrap,
        LocalCluster, TopologyOrigin, bootstrap_or_exit,
    },
    factory::{ComponentFactory, ComponentGraph},
    ownership::{FsOwnership, OwnershipProbe, current_user_name, resolve_install_path, resolve_owner},
};
pub use version::VersionInfo;

// Re-export the intent so callers only need this crate
pub use keel_common::BootstrapIntent;
