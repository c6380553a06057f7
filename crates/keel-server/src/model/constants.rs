//! Configuration property names and defaults for the keel binary

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "conf/keel.yml";

/// Prefix of environment variables mapped onto configuration keys
pub const ENV_PREFIX: &str = "KEEL";

// Property names
pub const HOME_PROPERTY: &str = "home";
pub const USER_PROPERTY: &str = "user";
pub const LOG_DIR_PROPERTY: &str = "log_dir";
pub const LOG_LEVEL_PROPERTY: &str = "log_level";
pub const LOG_CONSOLE_PROPERTY: &str = "log_console";
pub const LOG_FILE_PROPERTY: &str = "log_file";
pub const SHARED_STORAGE_PROPERTY: &str = "shared_storage";
pub const SHARED_STORAGE_CONFIG_PROPERTY: &str = "shared_storage_config";

// Defaults
pub const DEFAULT_HOME: &str = "/opt/keel";
pub const DEFAULT_LOG_LEVEL: &str = "info";
