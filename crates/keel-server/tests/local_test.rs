//! Keel Local Tests
//!
//! Drives `keel local` argument handling through a full bootstrap against an
//! XML topology whose single node is this host.

use clap::Parser;
use config::{Environment, Map};
use keel_common::host_name_or_ip;
use keel_core::{BootstrapEnv, BootstrapState, LocalBootstrap};
use keel_server::model::{Cli, Commands, Configuration, ENV_PREFIX};
use keel_server::service::local::{build_options, write_cluster};

/// Configuration that ignores the process environment
fn isolated_config(cli: &Cli) -> Configuration {
    let environment = Environment::with_prefix(ENV_PREFIX).source(Some(Map::new()));
    Configuration::build(cli, environment, false).unwrap()
}

#[test]
fn test_local_bootstrap_from_xml() {
    let home = tempfile::tempdir().unwrap();
    let xml_path = home.path().join("cluster.xml");
    std::fs::write(
        &xml_path,
        format!(
            r#"<cluster name="c1" type="single-inst" app-path="{app}">
  <node name="{host}">
    <coordinator id="5001" port="15300" data-dir="/data/cm"/>
    <storage id="6001" mirror="1" port="15400" data-dir="/data/dn1"/>
  </node>
</cluster>"#,
            app = home.path().display(),
            host = host_name_or_ip(),
        ),
    )
    .unwrap();

    let home_arg = home.path().to_string_lossy().into_owned();
    let xml_arg = xml_path.to_string_lossy().into_owned();
    let cli = Cli::try_parse_from([
        "keel", "local", "-U", "omm", "--home", &home_arg, "--xml", &xml_arg,
    ])
    .unwrap();
    let config = isolated_config(&cli);
    let Commands::Local(args) = &cli.command else {
        panic!("expected local subcommand");
    };

    let options = build_options(args, &config).unwrap();
    let mut bootstrap = LocalBootstrap::new(options, BootstrapEnv::system(config.home()));
    let cluster = bootstrap.run().unwrap();
    assert_eq!(bootstrap.state(), BootstrapState::Ready);

    let mut out = Vec::new();
    write_cluster(&cluster, &mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(json["origin"], "xml");
    assert_eq!(json["local_node"]["name"], host_name_or_ip());
    assert_eq!(json["components"]["coordinators"].as_array().unwrap().len(), 1);
    assert_eq!(json["components"]["storage_engines"].as_array().unwrap().len(), 1);
    assert!(!json["owner"]["user"].as_str().unwrap().is_empty());
}

#[test]
fn test_local_bootstrap_unknown_host_fails() {
    let home = tempfile::tempdir().unwrap();
    let xml_path = home.path().join("cluster.xml");
    std::fs::write(
        &xml_path,
        r#"<cluster name="c1" app-path="/opt/keel/app">
  <node name="node-that-is-not-this-host.invalid">
    <coordinator id="5001" port="15300" data-dir="/data/cm"/>
  </node>
</cluster>"#,
    )
    .unwrap();

    let xml_arg = xml_path.to_string_lossy().into_owned();
    let cli = Cli::try_parse_from(["keel", "local", "-U", "omm", "--xml", &xml_arg]).unwrap();
    let config = isolated_config(&cli);
    let Commands::Local(args) = &cli.command else {
        panic!("expected local subcommand");
    };

    let options = build_options(args, &config).unwrap();
    let mut bootstrap = LocalBootstrap::new(options, BootstrapEnv::system(home.path()));
    let err = bootstrap.run().unwrap_err();
    assert_eq!(err.code().code, 51619);
    assert_eq!(bootstrap.state(), BootstrapState::Failed);
}
