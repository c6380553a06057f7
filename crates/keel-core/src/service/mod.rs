// Core services for local node bootstrap

pub mod bootstrap;
pub mod factory;
pub mod ownership;

// Re-export commonly used types
pub use bootstrap::LocalBootstrap;
