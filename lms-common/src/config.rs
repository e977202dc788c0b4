//! Configuration loading
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is never fatal; the service starts on defaults
//! and logs a warning. An explicitly requested file that is missing or
//! malformed is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_DATABASE: &str = "LMS_DATABASE";
pub const ENV_BIND: &str = "LMS_BIND";
pub const ENV_KASPI_SECRET: &str = "KASPI_SECRET";
pub const ENV_KASPI_PAYMENT_URL: &str = "KASPI_PAYMENT_URL";
pub const ENV_API_SECRET: &str = "LMS_API_SECRET";
pub const ENV_DB_TIMEOUT_MS: &str = "LMS_DB_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "LMS_LOG_LEVEL";

pub const DEFAULT_BIND: &str = "127.0.0.1:5780";
pub const DEFAULT_DB_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings as they appear in `config.toml`
///
/// ```toml
/// database = "/var/lib/lms/lms.db"
/// bind = "0.0.0.0:5780"
/// kaspi_secret = "..."
/// kaspi_payment_url = "https://pay.kaspi.kz/pay/..."
/// api_secret = "..."
/// db_timeout_ms = 5000
/// log_level = "info"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database: Option<PathBuf>,
    pub bind: Option<String>,
    pub kaspi_secret: Option<String>,
    pub kaspi_payment_url: Option<String>,
    pub api_secret: Option<String>,
    pub db_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub bind: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub bind_addr: String,
    /// Shared secret for gateway webhook signatures; `None` fails the webhook closed
    pub kaspi_secret: Option<String>,
    pub kaspi_payment_url: String,
    /// Shared secret for internal API requests; `None` disables the check
    pub api_secret: Option<String>,
    pub db_timeout_ms: u64,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve configuration from CLI, environment, config file and defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = match &cli.config_path {
            Some(path) => TomlConfig::load(path)?,
            None => match default_config_file() {
                Some(path) => {
                    info!("Loading config file: {}", path.display());
                    TomlConfig::load(&path)?
                }
                None => {
                    warn!("No config file found, using defaults and environment");
                    TomlConfig::default()
                }
            },
        };

        Self::from_layers(cli, &file)
    }

    /// Merge the CLI layer and a parsed file layer with the environment
    pub fn from_layers(cli: &CliOverrides, file: &TomlConfig) -> Result<Self> {
        let database_path = cli
            .database
            .clone()
            .or_else(|| env_string(ENV_DATABASE).map(PathBuf::from))
            .or_else(|| file.database.clone())
            .unwrap_or_else(default_database_path);

        let bind_addr = cli
            .bind
            .clone()
            .or_else(|| env_string(ENV_BIND))
            .or_else(|| file.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let db_timeout_ms = match env_string(ENV_DB_TIMEOUT_MS) {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                Error::Config(format!("{} must be milliseconds: {}", ENV_DB_TIMEOUT_MS, e))
            })?,
            None => file.db_timeout_ms.unwrap_or(DEFAULT_DB_TIMEOUT_MS),
        };
        if db_timeout_ms == 0 {
            return Err(Error::Config("db_timeout_ms must be greater than zero".to_string()));
        }

        Ok(Self {
            database_path,
            bind_addr,
            kaspi_secret: non_empty(env_string(ENV_KASPI_SECRET).or_else(|| file.kaspi_secret.clone())),
            kaspi_payment_url: env_string(ENV_KASPI_PAYMENT_URL)
                .or_else(|| file.kaspi_payment_url.clone())
                .unwrap_or_default(),
            api_secret: non_empty(env_string(ENV_API_SECRET).or_else(|| file.api_secret.clone())),
            db_timeout_ms,
            log_level: env_string(ENV_LOG_LEVEL)
                .or_else(|| file.log_level.clone())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// Storage access bound as a `Duration`
    pub fn db_timeout(&self) -> std::time::Duration {
        crate::time::millis_to_duration(self.db_timeout_ms)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// First existing config file for the platform, if any
///
/// Linux checks `~/.config/lms/config.toml` then `/etc/lms/config.toml`.
pub fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("lms").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/lms/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lms"))
        .unwrap_or_else(|| PathBuf::from("./lms_data"))
        .join("lms.db")
}
