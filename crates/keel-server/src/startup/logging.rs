//! File-based logging with one root file plus per-component files.
//!
//! | Log File       | Component                          | Target Prefixes                       |
//! |----------------|------------------------------------|---------------------------------------|
//! | keel.log       | Root logger (all components)       | (all)                                 |
//! | bootstrap.log  | Local node bootstrap               | keel_core, keel_server::service::local |
//! | topology.log   | Topology loading and node lookup   | keel_topology                         |
//! | cron.log       | Crontab and periodic commands      | keel_cron, keel_server::service::cron |
//!
//! Log files are stored in `~/keel/logs` by default. Override with the
//! `log_dir` setting or `KEEL_LOG_DIR`. A run-specific `--log-file` receives
//! every event as well.
//!
//! Writers are blocking: the bootstrap exits the process on failure and the
//! cron daemon forks, neither of which would leave a background writer thread
//! able to flush.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Root log file name
const ROOT_LOG_FILE: &str = "keel.log";

struct ComponentLogDef {
    file_name: &'static str,
    /// Target module prefixes routed to this file
    targets: &'static [&'static str],
}

const COMPONENT_LOGS: &[ComponentLogDef] = &[
    ComponentLogDef {
        file_name: "bootstrap.log",
        targets: &["keel_core", "keel_server::service::local"],
    },
    ComponentLogDef {
        file_name: "topology.log",
        targets: &["keel_topology"],
    },
    ComponentLogDef {
        file_name: "cron.log",
        targets: &["keel_cron", "keel_server::service::cron"],
    },
];

// ---------------------------------------------------------------------------
// Log rotation policy
// ---------------------------------------------------------------------------

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    /// Rotate daily (default)
    Daily,
    Hourly,
    /// Never rotate (single file)
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Base log directory (default: `~/keel/logs`)
    pub log_dir: PathBuf,
    /// Human-readable output on stderr
    pub console_output: bool,
    pub level: Level,
    /// Extra non-rotating file receiving every event
    pub log_file: Option<PathBuf>,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            console_output: true,
            level: Level::INFO,
            log_file: None,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Create from application configuration.
    pub fn from_config(
        log_dir: Option<String>,
        console_output: bool,
        log_file: Option<PathBuf>,
        level: String,
    ) -> Self {
        Self {
            log_dir: log_dir.map(PathBuf::from).unwrap_or_else(default_log_dir),
            console_output,
            level: level.parse().unwrap_or(Level::INFO),
            log_file,
            rotation: LogRotation::Daily,
        }
    }
}

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join("keel").join("logs")
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

fn appender(rotation: Rotation, dir: &Path, file_name: &str) -> anyhow::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file_name)
        .build(dir)
        .with_context(|| format!("failed to open log file {}", dir.join(file_name).display()))
}

fn file_layer(appender: RollingFileAppender) -> impl Layer<Registry> + Send + Sync + 'static {
    fmt::layer()
        .with_writer(appender)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
}

/// Split a `--log-file` path into the directory and file name the appender wants
fn split_log_file(path: &Path) -> anyhow::Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?
        .to_string_lossy()
        .into_owned();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

/// Build every layer described by `config`, creating log directories as needed.
fn build_layers(config: &LoggingConfig) -> anyhow::Result<Vec<BoxedLayer>> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log directory {}", config.log_dir.display()))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(level_filter(config.level));
        layers.push(Box::new(console_layer));
    }

    let root_appender = appender(config.rotation.into(), &config.log_dir, ROOT_LOG_FILE)?;
    layers.push(Box::new(
        file_layer(root_appender).with_filter(level_filter(config.level)),
    ));

    for component in COMPONENT_LOGS {
        let component_appender =
            appender(config.rotation.into(), &config.log_dir, component.file_name)?;
        // Component files capture everything from their targets
        let mut targets = Targets::new();
        for target in component.targets {
            targets = targets.with_target(*target, LevelFilter::TRACE);
        }
        layers.push(Box::new(file_layer(component_appender).with_filter(targets)));
    }

    if let Some(path) = &config.log_file {
        let (dir, file_name) = split_log_file(path)?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        let run_appender = appender(Rotation::NEVER, &dir, &file_name)?;
        let filter: LevelFilter = config.level.into();
        layers.push(Box::new(file_layer(run_appender).with_filter(filter)));
    }

    Ok(layers)
}

/// Install the global subscriber: console output, the root `keel.log`, the
/// component files in [`COMPONENT_LOGS`] and the optional run log file.
///
/// `RUST_LOG` overrides the level of the console and root layers.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let layers = build_layers(config)?;

    Registry::default()
        .with(layers)
        .try_init()
        .context("failed to initialize logging")?;

    tracing::debug!(
        log_dir = %config.log_dir.display(),
        log_file = ?config.log_file,
        component_files = COMPONENT_LOGS.len(),
        "Logging initialized"
    );
    Ok(())
}
