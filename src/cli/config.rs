//! Application configuration
//!
//! Resolution order: JSON file, then environment variables, then CLI flags.
//! A missing config file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::session::{
    parse_token_lifetime, token_lifetime_or_default, LifetimeError, MAX_TOKEN_LIFETIME_DAYS,
};
use crate::auth::JwtConfig;
use crate::database::DatabaseConfig;
use crate::http_server::{Environment, HttpServerConfig};

use super::errors::{CliError, CliResult};

const DEFAULT_SECRET: &str = "CHANGE_THIS_SECRET_IN_PRODUCTION";
const REDACTED: &str = "<redacted>";
const LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE_NAME: &str = "log.txt";

/// Session token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Token lifetime such as `12h` or `1d` (default: "1d")
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime: String,

    #[serde(default = "default_claim")]
    pub issuer: String,

    #[serde(default = "default_claim")]
    pub audience: String,
}

fn default_secret() -> String {
    DEFAULT_SECRET.to_string()
}

fn default_token_lifetime() -> String {
    "1d".to_string()
}

fn default_claim() -> String {
    "imf-gadgets".to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            token_lifetime: default_token_lifetime(),
            issuer: default_claim(),
            audience: default_claim(),
        }
    }
}

impl AuthSettings {
    pub fn to_jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.secret.clone(),
            token_ttl: token_lifetime_or_default(&self.token_lifetime),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, overridden by RUST_LOG (default: "info")
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Also append JSON lines to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            file: None,
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub environment: Environment,
}

impl AppConfig {
    /// Load configuration from file, or defaults when the file is absent
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Load the file, apply process environment and the port flag, validate
    pub fn resolve(path: &Path, port: Option<u16>) -> CliResult<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        if let Some(port) = port {
            config.server.port = port;
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| CliError::config_error(format!("Invalid PORT: '{}'", port)))?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.secret = secret;
        }
        if let Some(lifetime) = lookup("JWT_EXPIRES_IN") {
            self.auth.token_lifetime = lifetime;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(env) = lookup("APP_ENV") {
            self.environment = env.parse().map_err(CliError::config_error)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(enabled) = lookup("LOG_TO_FILE") {
            self.logging.file = (enabled.trim() == "true").then(|| {
                let name = lookup("LOG_FILE_NAME")
                    .unwrap_or_else(|| DEFAULT_LOG_FILE_NAME.to_string());
                PathBuf::from(LOG_DIR).join(name)
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.auth.secret.trim().is_empty() {
            return Err(CliError::config_error("auth.secret must not be empty"));
        }

        if self.environment == Environment::Production && self.auth.secret == DEFAULT_SECRET {
            return Err(CliError::config_error(
                "auth.secret must be changed from its default in production",
            ));
        }

        if parse_token_lifetime(&self.auth.token_lifetime) == Err(LifetimeError::TooLong) {
            return Err(CliError::config_error(format!(
                "auth.token_lifetime '{}' exceeds {} days",
                self.auth.token_lifetime, MAX_TOKEN_LIFETIME_DAYS
            )));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(CliError::config_error(
                "server.request_timeout_secs must be > 0",
            ));
        }

        if self.database.busy_timeout_ms == 0 {
            return Err(CliError::config_error(
                "database.busy_timeout_ms must be > 0",
            ));
        }

        Ok(())
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.auth.secret = REDACTED.to_string();
        config
    }
}
