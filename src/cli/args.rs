//! CLI argument definitions using clap
//!
//! Commands:
//! - imf-gadgets serve --config <path> [--port <port>]
//! - imf-gadgets init-db --config <path>
//! - imf-gadgets check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// IMF gadget inventory API
#[derive(Parser, Debug)]
#[command(name = "imf-gadgets")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./imf.json")]
        config: PathBuf,

        /// Port to listen on, overriding config and PORT
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create the SQLite schema and exit
    InitDb {
        /// Path to configuration file
        #[arg(long, default_value = "./imf.json")]
        config: PathBuf,
    },

    /// Print the effective configuration with secrets redacted
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./imf.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_with_port() {
        let cli = Cli::try_parse_from(["imf-gadgets", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("./imf.json"));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_init_db_with_config() {
        let cli =
            Cli::try_parse_from(["imf-gadgets", "init-db", "--config", "/etc/imf.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::InitDb { config } if config == PathBuf::from("/etc/imf.json")
        ));
    }
}
