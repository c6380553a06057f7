//! `keel local`: bootstrap the local node and print its component graph

use std::io::Write;

use anyhow::Context;
use tracing::info;

use keel_core::{
    BootstrapEnv, BootstrapOptions, LocalBootstrap, LocalCluster, bootstrap_or_exit,
    current_user_name,
};

use crate::model::{Configuration, LocalArgs};

/// Translate command line arguments and configuration into bootstrap options.
///
/// The user defaults to the effective user of this process.
pub fn build_options(args: &LocalArgs, config: &Configuration) -> anyhow::Result<BootstrapOptions> {
    let user = match config.user() {
        Some(user) => user,
        None => current_user_name().context("current user has no account entry; pass --user")?,
    };

    let mut options = BootstrapOptions::new(args.intent, user)
        .with_modes(args.alternate_backend, config.shared_storage())
        .with_shared_storage_config(config.shared_storage_config())
        .with_consensus_mode(args.consensus)
        .with_init_params(args.init_param.clone())
        .with_disaster_recovery(args.disaster_recovery());
    if let Some(xml) = &args.xml {
        options = options.with_xml(xml.clone());
    }
    Ok(options)
}

/// Write the populated component graph as pretty JSON
pub fn write_cluster(cluster: &LocalCluster, out: &mut impl Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(cluster)?;
    writeln!(out, "{}", json)?;
    Ok(())
}

/// Run the bootstrap against the installation under the configured home.
///
/// Any bootstrap error terminates the process with status 1.
pub fn run_local(args: &LocalArgs, config: &Configuration) -> anyhow::Result<()> {
    let options = build_options(args, config)?;
    let home = config.home();
    info!(
        intent = %options.intent,
        user = %options.user,
        home = %home.display(),
        "Bootstrapping local node"
    );

    let mut bootstrap = LocalBootstrap::new(options, BootstrapEnv::system(home));
    let cluster = bootstrap_or_exit(&mut bootstrap);

    write_cluster(&cluster, &mut std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use config::{Environment, Map};
    use keel_common::BootstrapIntent;
    use keel_core::ConfigSource;

    use super::*;
    use crate::model::{Cli, Commands, ENV_PREFIX};

    /// Parse `keel local <args>` against the given `KEEL_*` variables only
    fn local_with_env(args: &[&str], env: &[(&str, &str)]) -> (LocalArgs, Configuration) {
        let mut argv = vec!["keel", "local"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        let vars: Map<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let environment = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(vars));
        let config = Configuration::build(&cli, environment, false).unwrap();
        let Commands::Local(args) = cli.command else {
            panic!("expected local subcommand");
        };
        (args, config)
    }

    fn local(args: &[&str]) -> (LocalArgs, Configuration) {
        local_with_env(args, &[])
    }

    #[test]
    fn test_options_from_flags() {
        let (args, config) = local(&[
            "-U",
            "omm",
            "--intent",
            "start",
            "--consensus",
            "--alternate-backend",
            "--init-param",
            "max_connections=200",
            "--dr-config",
            "10.0.0.9:6000",
        ]);
        let options = build_options(&args, &config).unwrap();

        assert_eq!(options.user, "omm");
        assert_eq!(options.intent, BootstrapIntent::Start);
        assert_eq!(options.config_source, ConfigSource::Snapshot);
        assert!(options.modes.alternate_backend);
        assert!(options.storage.consensus_mode);
        assert_eq!(options.storage.init_params, vec!["max_connections=200"]);
        assert_eq!(options.storage.disaster_recovery.endpoint_config, "10.0.0.9:6000");
        assert_eq!(options.storage.disaster_recovery.cluster_mode, "");
    }

    #[test]
    fn test_xml_flag_selects_xml_source() {
        let (args, config) = local(&["-U", "omm", "-X"]);
        let options = build_options(&args, &config).unwrap();
        assert_eq!(options.config_source, ConfigSource::Xml(None));

        let (args, config) = local(&["-U", "omm", "--xml", "/etc/keel/cluster.xml"]);
        let options = build_options(&args, &config).unwrap();
        assert_eq!(
            options.config_source,
            ConfigSource::Xml(Some(PathBuf::from("/etc/keel/cluster.xml")))
        );
    }

    #[test]
    fn test_user_and_shared_storage_from_environment() {
        let (args, config) = local_with_env(
            &[],
            &[("KEEL_USER", "dbadmin"), ("KEEL_SHARED_STORAGE", "true")],
        );
        let options = build_options(&args, &config).unwrap();
        assert_eq!(options.user, "dbadmin");
        assert!(options.modes.shared_storage);

        let (args, config) = local(&["-U", "omm"]);
        let options = build_options(&args, &config).unwrap();
        assert!(!options.modes.shared_storage);
    }

    #[test]
    fn test_shared_storage_flag_enables_mode() {
        let (args, config) = local(&["-U", "omm", "--shared-storage", "--shared-storage-config", "vg0"]);
        let options = build_options(&args, &config).unwrap();
        assert!(options.modes.shared_storage);
        assert_eq!(options.shared_storage_config, "vg0");
    }
}
