//! Configuration management for the ingest service
//!
//! Two-tier configuration:
//! 1. **TOML bootstrap**: database path, port, time zone, logging
//!    (static, bootstrap only)
//! 2. **Database runtime**: tunable settings from the `settings` table
//!
//! Missing or NULL database settings are initialized with built-in
//! defaults and written back.
//!
//! # Settings sources priority
//!
//! 1. Command-line arguments (--port, --database, --timezone)
//! 2. Environment variables (PUNCHD_PORT, PUNCHD_TZ)
//! 3. TOML configuration file
//! 4. Database settings table
//! 5. Built-in defaults (code constants)

use crate::db;
use crate::error::{Error, Result};
use punchd_common::LocalDayPolicy;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The service must restart
/// to pick up changes to the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (relative or absolute)
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HTTP listener port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment-local UTC offset for day keying (e.g. "+05:00")
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            port: default_port(),
            timezone: default_timezone(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("punchd.db")
}

fn default_port() -> u16 {
    8080
}

fn default_timezone() -> String {
    "Z".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub timezone: Option<String>,
}

/// Bootstrap application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database file path
    pub database_path: PathBuf,

    /// HTTP listener port
    pub port: u16,

    /// Local-day policy derived from the configured time zone
    pub policy: LocalDayPolicy,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load bootstrap configuration from an optional TOML file with CLI
    /// overrides applied on top
    pub async fn load(toml_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match toml_path {
            Some(path) => {
                let toml_str = tokio::fs::read_to_string(path).await.map_err(|e| {
                    Error::Config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                let parsed: TomlConfig = toml::from_str(&toml_str)
                    .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
                info!("Loaded TOML configuration from {:?}", path);
                parsed
            }
            None => TomlConfig::default(),
        };

        let database_path = overrides
            .database_path
            .unwrap_or(toml_config.database_path);
        let port = overrides.port.unwrap_or(toml_config.port);
        let timezone = overrides.timezone.unwrap_or(toml_config.timezone);

        let policy = LocalDayPolicy::parse(&timezone)
            .map_err(|e| Error::Config(format!("Invalid timezone setting: {}", e)))?;

        Ok(Config {
            database_path,
            port,
            policy,
            logging: toml_config.logging,
        })
    }
}

/// Runtime settings loaded from the database `settings` table
///
/// All values have built-in defaults; missing keys are initialized with
/// the default and written back for consistency.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Upper bound on per-record ingest processing
    pub record_timeout_ms: u64,

    /// Subscriber fanout channel capacity
    pub event_buffer_size: usize,

    /// Device state codes designating a check-in punch
    pub checkin_state_codes: Vec<String>,
}

impl RuntimeSettings {
    /// Load runtime settings from the database
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let settings = Self {
            record_timeout_ms: db::settings::get_record_timeout_ms(pool).await?,
            event_buffer_size: db::settings::get_event_buffer_size(pool).await?,
            checkin_state_codes: db::settings::get_checkin_state_codes(pool).await?,
        };
        info!("Loaded runtime settings from database");
        Ok(settings)
    }

    /// Per-record processing timeout as a Duration
    pub fn record_timeout(&self) -> Duration {
        Duration::from_millis(self.record_timeout_ms)
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            record_timeout_ms: 5000,
            event_buffer_size: 100,
            checkin_state_codes: vec!["0".to_string(), "IN".to_string()],
        }
    }
}
