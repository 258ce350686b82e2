//! CLI command implementations

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::database::{Backend, Stores};
use crate::http_server::{AppState, HttpServer};

use super::args::Command;
use super::config::{AppConfig, LoggingConfig};
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::InitDb { config } => init_db(&config),
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// With `logging.file` set, JSON lines are also appended to that file.
pub fn init_tracing(logging: &LoggingConfig) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &logging.file {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    // A subscriber may already be installed (tests); keep it
    let _ = if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    Ok(())
}

/// Open `path` for appending, creating parent directories
fn open_log_file(path: &Path) -> CliResult<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CliError::io_error(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CliError::io_error(format!("Failed to open {}: {}", path.display(), e)))
}

/// Open the stores, serve HTTP until shutdown, then close the stores
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = AppConfig::resolve(config_path, port)?;
    init_tracing(&config.logging)?;

    let stores = Stores::open(&config.database).map_err(CliError::database_error)?;
    info!(
        backend = ?config.database.backend,
        environment = %config.environment,
        "stores opened"
    );

    let state = AppState::new(&stores, config.auth.to_jwt_config(), config.environment);
    let server = HttpServer::new(config.server.clone(), state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let served = rt.block_on(server.start());

    stores.close().map_err(CliError::database_error)?;
    info!("stores closed");

    served.map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
}

/// Create the SQLite schema if missing
pub fn init_db(config_path: &Path) -> CliResult<()> {
    let config = AppConfig::resolve(config_path, None)?;
    init_tracing(&config.logging)?;

    if config.database.backend != Backend::Sqlite {
        return Err(CliError::config_error(
            "init-db requires the sqlite database backend",
        ));
    }

    let stores = Stores::open(&config.database).map_err(CliError::database_error)?;
    stores.close().map_err(CliError::database_error)?;

    println!("Database ready at {}", config.database.path.display());
    Ok(())
}

/// Print the effective configuration, secrets redacted
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = AppConfig::resolve(config_path, None)?;
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, value: serde_json::Value) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("imf.json");
        fs::write(&config_path, value.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_init_db_creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("gadgets.db");
        let config_path = write_config(
            &temp_dir,
            json!({ "database": { "path": db_path.to_string_lossy() } }),
        );

        init_db(&config_path).unwrap();
        assert!(db_path.exists());

        // Idempotent on an existing schema
        init_db(&config_path).unwrap();
    }

    #[test]
    fn test_init_db_rejects_memory_backend() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir, json!({ "database": { "backend": "memory" } }));

        let err = init_db(&config_path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_log_file_opened_for_append() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("log.txt");

        let mut file = open_log_file(&log_path).unwrap();
        std::io::Write::write_all(&mut file, b"first\n").unwrap();
        drop(file);

        let mut file = open_log_file(&log_path).unwrap();
        std::io::Write::write_all(&mut file, b"second\n").unwrap();
        drop(file);

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("logs");
        fs::write(&blocker, "not a directory").unwrap();

        let logging = LoggingConfig {
            file: Some(blocker.join("log.txt")),
            ..LoggingConfig::default()
        };
        let err = init_tracing(&logging).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::IoError);
    }

    #[test]
    fn test_check_config_rejects_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            &temp_dir,
            json!({ "server": { "request_timeout_secs": 0 } }),
        );

        let err = check_config(&config_path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
