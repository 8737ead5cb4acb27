//! sard-server: configuration and process wiring.
//!
//! This crate holds the pieces the binary needs before any request is
//! served: configuration loading (defaults, YAML file, environment
//! overrides) and logging initialization.

pub mod config;
pub mod logging;

pub use config::{ConfigLoadError, ServerConfig};
pub use logging::{init_logging, LoggingConfig};
