//! # Database Module
//!
//! Store backends and their lifecycle. The server opens one [`Stores`] at
//! startup, hands its trait objects to the services, and closes it after
//! shutdown.

pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{InMemoryUserRepository, UserRepository};
use crate::gadgets::{GadgetStore, InMemoryGadgetStore};

pub use sqlite::SqliteDatabase;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Persistent SQLite file
    Sqlite,
    /// Process memory, lost on exit
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    /// SQLite file path (default: "./imf.db")
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// How long a write waits on a locked database (default: 5000)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_backend() -> Backend {
    Backend::Sqlite
}

fn default_path() -> PathBuf {
    PathBuf::from("./imf.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// The user and gadget stores of one backend
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub gadgets: Arc<dyn GadgetStore>,
    sqlite: Option<Arc<SqliteDatabase>>,
}

impl Stores {
    /// Open the configured backend
    pub fn open(config: &DatabaseConfig) -> Result<Self, String> {
        match config.backend {
            Backend::Memory => Ok(Self::in_memory()),
            Backend::Sqlite => {
                let db = SqliteDatabase::open(
                    &config.path,
                    Duration::from_millis(config.busy_timeout_ms),
                )
                .map_err(|e| format!("failed to open {}: {e}", config.path.display()))?;
                Ok(Self::sqlite(Arc::new(db)))
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            gadgets: Arc::new(InMemoryGadgetStore::new()),
            sqlite: None,
        }
    }

    pub fn sqlite(db: Arc<SqliteDatabase>) -> Self {
        Self {
            users: db.clone(),
            gadgets: db.clone(),
            sqlite: Some(db),
        }
    }

    /// Release the backend. In-memory stores have nothing to close.
    pub fn close(&self) -> Result<(), String> {
        match &self.sqlite {
            Some(db) => db.close(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: DatabaseConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.path, PathBuf::from("./imf.db"));
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_open_memory_backend() {
        let config = DatabaseConfig {
            backend: Backend::Memory,
            ..Default::default()
        };
        let stores = Stores::open(&config).unwrap();
        assert!(stores.gadgets.list(None).unwrap().is_empty());
        stores.close().unwrap();
    }

    #[test]
    fn test_open_sqlite_backend_and_close() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DatabaseConfig {
            backend: Backend::Sqlite,
            path: dir.path().join("imf.db"),
            busy_timeout_ms: 100,
        };
        let stores = Stores::open(&config).unwrap();
        assert!(!stores.users.email_exists("ethan@imf.gov").unwrap());

        stores.close().unwrap();
        assert!(stores.users.email_exists("ethan@imf.gov").is_err());
    }

    #[test]
    fn test_open_sqlite_in_missing_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DatabaseConfig {
            backend: Backend::Sqlite,
            path: dir.path().join("missing").join("imf.db"),
            busy_timeout_ms: 100,
        };
        assert!(Stores::open(&config).is_err());
    }
}
