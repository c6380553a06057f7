// Main library module for Keel - local node bootstrap for distributed database clusters
// The `keel` binary is a thin wrapper over these modules.

pub mod model; // Command line and configuration
pub mod service; // Subcommand handlers
pub mod startup; // Application startup utilities
