//! CLI module for the gadget API
//!
//! Provides command-line interface for:
//! - serve: Open the stores and run the HTTP server
//! - init-db: Create the SQLite schema
//! - check-config: Print the effective configuration

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_config, init_db, init_tracing, run, run_command, serve};
pub use config::{AppConfig, AuthSettings, LoggingConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
