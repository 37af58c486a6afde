//! # mostrador-backoffice
//!
//! Command layer and process setup for the `mostrador` binary.
//!
//! ## Startup
//! ```text
//! main()
//!   ├── init_tracing()            RUST_LOG or "info,mostrador=debug,sqlx=warn"
//!   ├── AppConfig::from_env()     MOSTRADOR_* variables
//!   ├── Database::new(DbConfig)   pool + migrations
//!   └── commands::*               one call per CLI subcommand
//! ```

pub mod commands;
pub mod config;
pub mod error;

use tracing_subscriber::EnvFilter;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ErrorCode};

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// command output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mostrador=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
