//! Back-office configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::time::Duration;

use atelier_db::DbConfig;
use serde::{Deserialize, Serialize};

/// Back-office configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// SQLite database file
    pub db_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// SQLite busy timeout in seconds
    pub db_busy_timeout_secs: u64,

    /// Prefix used when amounts are echoed in log lines
    pub currency_symbol: String,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = AdminConfig {
            db_path: lookup("ATELIER_DB_PATH").unwrap_or_else(|| "./atelier.db".to_string()),

            db_max_connections: lookup("ATELIER_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ATELIER_DB_MAX_CONNECTIONS".to_string()))?,

            db_busy_timeout_secs: lookup("ATELIER_DB_BUSY_TIMEOUT_SECS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("ATELIER_DB_BUSY_TIMEOUT_SECS".to_string())
                })?,

            currency_symbol: lookup("ATELIER_CURRENCY_SYMBOL").unwrap_or_else(|| "₹".to_string()),
        };

        if config.db_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("ATELIER_DB_PATH".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("ATELIER_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path)
            .max_connections(self.db_max_connections)
            .busy_timeout(Duration::from_secs(self.db_busy_timeout_secs))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
