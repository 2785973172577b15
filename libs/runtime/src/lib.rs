//! Process-level runtime support: layered configuration, home directory
//! resolution and logging bootstrap.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, AppConfigProvider, CliArgs, LoggingConfig, Section, ServerConfig};
