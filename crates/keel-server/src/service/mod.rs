// Subcommand handlers for the keel binary

pub mod cron; // Crontab management and periodic commands
pub mod local; // Local node bootstrap
