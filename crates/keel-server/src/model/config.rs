//! Configuration management for the keel binary
//!
//! Settings are layered: built-in defaults, then the configuration file,
//! then `KEEL_*` environment variables, then command line flags.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File};

use keel_common::{BootstrapIntent, SHARED_STORAGE_HOME_ENV};
use keel_core::DisasterRecoveryConfig;

use super::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_HOME, DEFAULT_LOG_LEVEL, ENV_PREFIX, HOME_PROPERTY,
    LOG_CONSOLE_PROPERTY, LOG_DIR_PROPERTY, LOG_FILE_PROPERTY, LOG_LEVEL_PROPERTY,
    SHARED_STORAGE_CONFIG_PROPERTY, SHARED_STORAGE_PROPERTY, USER_PROPERTY,
};
use crate::startup::LoggingConfig;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "keel", version, about = "Local node bootstrap for database clusters")]
pub struct Cli {
    /// Configuration file (default: conf/keel.yml when present)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Additional log file receiving every event
    #[arg(short = 'l', long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bootstrap the local node and print its component graph
    Local(LocalArgs),
    /// Manage crontab entries and periodic commands
    #[command(subcommand)]
    Cron(CronCommand),
}

#[derive(Debug, Args)]
pub struct LocalArgs {
    /// OS user owning the installation (default: current user)
    #[arg(short = 'U', long = "user")]
    pub user: Option<String>,
    /// Load the topology from an XML file instead of the JSON snapshots
    #[arg(short = 'X', long = "xml", num_args = 0..=1)]
    pub xml: Option<Option<PathBuf>>,
    #[arg(short = 't', long = "intent", default_value_t = BootstrapIntent::Inspect)]
    pub intent: BootstrapIntent,
    /// Installation home holding `bin/` with the cluster snapshots
    #[arg(long = "home")]
    pub home: Option<PathBuf>,
    #[arg(long = "alternate-backend")]
    pub alternate_backend: bool,
    /// Run storage engines in consensus replication mode
    #[arg(long = "consensus")]
    pub consensus: bool,
    #[arg(long = "shared-storage")]
    pub shared_storage: bool,
    #[arg(long = "shared-storage-config")]
    pub shared_storage_config: Option<String>,
    /// Storage engine initialization parameter, repeatable
    #[arg(long = "init-param")]
    pub init_param: Vec<String>,
    #[arg(long = "dr-config")]
    pub dr_config: Option<String>,
    #[arg(long = "dr-cluster-mode")]
    pub dr_cluster_mode: Option<String>,
}

impl LocalArgs {
    pub fn disaster_recovery(&self) -> DisasterRecoveryConfig {
        DisasterRecoveryConfig {
            endpoint_config: self.dr_config.clone().unwrap_or_default(),
            cluster_mode: self.dr_cluster_mode.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CronCommand {
    /// Print the current user's crontab
    List,
    /// Replace the current user's crontab with a file
    Install { path: PathBuf },
    /// Report whether the current user may use crontab
    Check,
    /// Run a command every second in a detached background process
    Run {
        #[arg(long = "pid-file")]
        pid_file: PathBuf,
        /// Shell command line, handed to `sh -c` as one string
        command: String,
    },
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let shared_storage = std::env::var_os(SHARED_STORAGE_HOME_ENV).is_some();
        Self::build(
            cli,
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
            shared_storage,
        )
    }

    /// Layer the configuration with an explicit environment source and
    /// shared-storage default instead of reading the process environment
    pub fn build(
        cli: &Cli,
        environment: Environment,
        shared_storage: bool,
    ) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut builder = Config::builder()
            .set_default(HOME_PROPERTY, DEFAULT_HOME)?
            .set_default(LOG_LEVEL_PROPERTY, DEFAULT_LOG_LEVEL)?
            .set_default(LOG_CONSOLE_PROPERTY, true)?
            .set_default(SHARED_STORAGE_PROPERTY, shared_storage)?
            .add_source(file)
            .add_source(environment);

        if let Some(path) = &cli.log_file {
            builder = builder.set_override(LOG_FILE_PROPERTY, path_value(path))?;
        }
        if let Commands::Local(args) = &cli.command {
            if let Some(home) = &args.home {
                builder = builder.set_override(HOME_PROPERTY, path_value(home))?;
            }
            if let Some(user) = &args.user {
                builder = builder.set_override(USER_PROPERTY, user.as_str())?;
            }
            if args.shared_storage {
                builder = builder.set_override(SHARED_STORAGE_PROPERTY, true)?;
            }
            if let Some(value) = &args.shared_storage_config {
                builder = builder.set_override(SHARED_STORAGE_CONFIG_PROPERTY, value.as_str())?;
            }
        }

        let config = builder
            .build()
            .context("failed to build configuration")?;

        Ok(Configuration { config })
    }

    // ========================================================================
    // Installation
    // ========================================================================

    pub fn home(&self) -> PathBuf {
        self.config
            .get_string(HOME_PROPERTY)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_HOME))
    }

    pub fn user(&self) -> Option<String> {
        self.config
            .get_string(USER_PROPERTY)
            .ok()
            .filter(|u| !u.is_empty())
    }

    pub fn shared_storage(&self) -> bool {
        self.config
            .get_bool(SHARED_STORAGE_PROPERTY)
            .unwrap_or(false)
    }

    pub fn shared_storage_config(&self) -> String {
        self.config
            .get_string(SHARED_STORAGE_CONFIG_PROPERTY)
            .unwrap_or_default()
    }

    // ========================================================================
    // Logging
    // ========================================================================

    pub fn log_file(&self) -> Option<PathBuf> {
        self.config.get_string(LOG_FILE_PROPERTY).ok().map(PathBuf::from)
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOG_DIR_PROPERTY).ok(),
            self.config.get_bool(LOG_CONSOLE_PROPERTY).unwrap_or(true),
            self.log_file(),
            self.config
                .get_string(LOG_LEVEL_PROPERTY)
                .unwrap_or(DEFAULT_LOG_LEVEL.to_string()),
        )
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
