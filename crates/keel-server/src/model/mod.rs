//! Data models module
//!
//! # Module Structure
//!
//! - `constants` - Configuration property names and defaults
//! - `config` - Command line and layered configuration

pub mod config;
pub mod constants;

// Re-export commonly used types at the module level
pub use config::{Cli, Commands, Configuration, CronCommand, LocalArgs};
pub use constants::*;
