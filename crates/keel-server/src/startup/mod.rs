//! Application startup utilities module.

mod logging;

pub use logging::{LogRotation, LoggingConfig, init_logging};
