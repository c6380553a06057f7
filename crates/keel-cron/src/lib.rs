//! Keel Cron - Scheduling helpers
//!
//! This crate provides:
//! - Crontab listing, installation and permission checks
//! - A detached runner that repeats a command every second under a pid lock
//!
//! It is independent of the bootstrap path: errors are returned to the caller,
//! which decides whether to terminate.

pub mod command;
pub mod crontab;
pub mod daemon;
pub mod error;

pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use crontab::Crontab;
pub use daemon::{PidLock, Timer, spawn_periodic};
pub use error::CronError;
