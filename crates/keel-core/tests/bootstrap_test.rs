//! Keel Core Bootstrap Tests
//!
//! End-to-end bootstrap runs against snapshot and XML files on disk.
//! These tests use the real filesystem ownership probe.

use std::path::{Path, PathBuf};

use keel_core::{
    BootstrapEnv, BootstrapError, BootstrapIntent, BootstrapOptions, BootstrapState, Component,
    DisasterRecoveryConfig, FsOwnership, LocalBootstrap, TopologyOrigin, VersionInfo,
};
use keel_topology::{
    ClusterTopology, ClusterType, FileTopologySource, InstanceDescriptor, InstanceRole,
    InstanceType, NodeInfo,
};
use tempfile::TempDir;

fn storage(id: u32, mirror: i32, host: &str) -> InstanceDescriptor {
    InstanceDescriptor {
        instance_id: id,
        mirror_id: mirror,
        role: InstanceRole::Storage,
        host_name: host.to_string(),
        listen_ips: vec!["10.0.0.1".to_string()],
        port: 15400,
        ha_port: Some(15401),
        data_dir: PathBuf::from(format!("/data/dn{}", id)),
        instance_type: InstanceType::Primary,
    }
}

/// Writes a two-node static snapshot whose install path is `<home>/app`
fn write_static_snapshot(home: &Path) -> ClusterTopology {
    let app_path = home.join("app");
    std::fs::create_dir_all(app_path.join("bin")).unwrap();

    let mut a = NodeInfo::new("node-a");
    a.storage_engines = vec![storage(6001, 1, "node-a"), storage(6003, 2, "node-a")];
    let mut b = NodeInfo::new("node-b");
    b.storage_engines = vec![storage(6002, 1, "node-b"), storage(6004, 2, "node-b")];

    let topology = ClusterTopology {
        name: "c1".to_string(),
        cluster_type: ClusterType::SinglePrimaryMultiStandby,
        app_path,
        nodes: vec![a, b],
    };

    let source = FileTopologySource::new(home);
    std::fs::create_dir_all(source.static_config_path().parent().unwrap()).unwrap();
    std::fs::write(
        source.static_config_path(),
        serde_json::to_string_pretty(&topology).unwrap(),
    )
    .unwrap();
    topology
}

fn env(home: &Path, host: &str) -> BootstrapEnv {
    BootstrapEnv {
        source: Box::new(FileTopologySource::new(home)),
        host: Box::new(host.to_string()),
        owner_probe: Box::new(FsOwnership),
        version: VersionInfo::new("1.0.0", "abc123"),
    }
}

// ============== Snapshot Bootstrap Tests ==============

#[test]
fn test_shared_storage_node_builds_companions() {
    let home = TempDir::new().unwrap();
    let topology = write_static_snapshot(home.path());

    let options = BootstrapOptions::new(BootstrapIntent::Start, "omm")
        .with_modes(false, true)
        .with_shared_storage_config("vg_data:/dev/sdb")
        .with_consensus_mode(true)
        .with_init_params(vec!["-E UTF8".to_string()])
        .with_disaster_recovery(DisasterRecoveryConfig {
            endpoint_config: "10.1.0.1:5000".to_string(),
            cluster_mode: "dr-standby".to_string(),
        });
    let mut bootstrap = LocalBootstrap::new(options, env(home.path(), "node-a"));
    let cluster = bootstrap.run().unwrap();

    assert_eq!(bootstrap.state(), BootstrapState::Ready);
    assert_eq!(cluster.origin, TopologyOrigin::Static);
    assert_eq!(cluster.components.storage_engines.len(), 2);
    assert_eq!(cluster.components.shared_storage.len(), 2);
    assert!(cluster.components.coordinators.is_empty());

    let bin_path = topology.app_path.join("bin");
    for component in cluster.components.iter() {
        assert_eq!(component.bin_path(), &bin_path);
        assert_eq!(
            component.settings().shared_storage_config.as_deref(),
            Some("vg_data:/dev/sdb")
        );
    }

    let dn = &cluster.components.storage_engines[0];
    assert!(dn.consensus_mode);
    assert_eq!(dn.disaster_recovery.cluster_mode, "dr-standby");
    assert_eq!(dn.peers.len(), 1);
    assert_eq!(dn.peers[0].host_name, "node-b");

    assert!(!cluster.owner.user.is_empty());
    assert!(!cluster.owner.group.is_empty());
}

#[test]
fn test_plain_node_has_no_shared_storage() {
    let home = TempDir::new().unwrap();
    write_static_snapshot(home.path());

    let mut bootstrap = LocalBootstrap::new(
        BootstrapOptions::new(BootstrapIntent::Inspect, "omm"),
        env(home.path(), "node-b"),
    );
    let cluster = bootstrap.run().unwrap();
    assert_eq!(cluster.local_node.name, "node-b");
    assert_eq!(cluster.components.storage_engines.len(), 2);
    assert!(cluster.components.shared_storage.is_empty());
}

#[test]
fn test_repeated_bootstrap_yields_equal_components() {
    let home = TempDir::new().unwrap();
    write_static_snapshot(home.path());

    let run = || {
        let options = BootstrapOptions::new(BootstrapIntent::Inspect, "omm").with_modes(true, true);
        LocalBootstrap::new(options, env(home.path(), "node-a"))
            .run()
            .unwrap()
    };
    assert_eq!(run().components, run().components);
}

#[test]
fn test_host_outside_cluster_is_rejected() {
    let home = TempDir::new().unwrap();
    write_static_snapshot(home.path());

    let mut bootstrap = LocalBootstrap::new(
        BootstrapOptions::new(BootstrapIntent::Start, "omm"),
        env(home.path(), "node-z"),
    );
    let err = bootstrap.run().unwrap_err();
    assert!(matches!(err, BootstrapError::NodeNotFound { .. }));
    assert_eq!(bootstrap.state(), BootstrapState::Failed);
}

#[test]
fn test_symlinked_install_path_owner() {
    let home = TempDir::new().unwrap();
    let mut topology = write_static_snapshot(home.path());

    let target = home.path().join("app_abc123");
    std::fs::create_dir_all(&target).unwrap();
    let link = home.path().join("app-link");
    std::os::unix::fs::symlink(&target, &link).unwrap();
    topology.app_path = link;
    let source = FileTopologySource::new(home.path());
    std::fs::write(
        source.static_config_path(),
        serde_json::to_string(&topology).unwrap(),
    )
    .unwrap();

    let mut bootstrap = LocalBootstrap::new(
        BootstrapOptions::new(BootstrapIntent::Inspect, "omm"),
        env(home.path(), "node-a"),
    );
    let cluster = bootstrap.run().unwrap();

    use keel_core::OwnershipProbe;
    assert_eq!(cluster.owner, FsOwnership.owner_of(&target).unwrap());
}

// ============== XML Bootstrap Tests ==============

#[test]
fn test_xml_bootstrap() {
    let home = TempDir::new().unwrap();
    let app = home.path().join("app");
    std::fs::create_dir_all(&app).unwrap();
    let xml_path = home.path().join("cluster.xml");
    std::fs::write(
        &xml_path,
        format!(
            r#"<cluster name="x1" type="single-inst" app-path="{}">
  <node name="node-a">
    <coordinator id="5001" port="15300" data-dir="/data/cm"/>
    <agent id="5101" port="15301" data-dir="/data/cma"/>
    <storage id="6001" mirror="1" port="15400" data-dir="/data/dn1"/>
  </node>
</cluster>"#,
            app.display()
        ),
    )
    .unwrap();

    let options =
        BootstrapOptions::new(BootstrapIntent::Reconfigure, "omm").with_xml(Some(xml_path));
    let mut bootstrap = LocalBootstrap::new(options, env(home.path(), "node-a"));
    let cluster = bootstrap.run().unwrap();

    assert_eq!(cluster.origin, TopologyOrigin::Xml);
    assert_eq!(cluster.components.coordinators.len(), 2);
    assert_eq!(cluster.components.storage_engines.len(), 1);
    assert!(cluster.components.storage_engines[0].peers.is_empty());
}

#[test]
fn test_xml_file_absent() {
    let home = TempDir::new().unwrap();
    let options = BootstrapOptions::new(BootstrapIntent::Inspect, "omm")
        .with_xml(Some(home.path().join("absent.xml")));
    let mut bootstrap = LocalBootstrap::new(options, env(home.path(), "node-a"));
    let err = bootstrap.run().unwrap_err();
    assert_eq!(err.kind(), keel_common::ErrorKind::Configuration);
}
