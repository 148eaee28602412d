//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Listen address (`STOCKROOM_BIND_ADDR`, default `0.0.0.0:8000`)
    pub bind_addr: SocketAddr,

    /// SQLite file (`STOCKROOM_DATABASE_PATH`, default `./stockroom.db`)
    pub database_path: PathBuf,

    /// Pool size (`STOCKROOM_DB_MAX_CONNECTIONS`, default 5)
    pub db_max_connections: u32,

    /// Largest accepted request body, CSV uploads included
    /// (`STOCKROOM_MAX_UPLOAD_BYTES`, default 10 MiB)
    pub max_upload_bytes: usize,

    /// Emit JSON log lines (`STOCKROOM_LOG_JSON`, default false)
    pub log_json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_path: PathBuf::from("./stockroom.db"),
            db_max_connections: 5,
            max_upload_bytes: 10 * 1024 * 1024,
            log_json: false,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            bind_addr: parse_or(&lookup, "STOCKROOM_BIND_ADDR", defaults.bind_addr)?,
            database_path: lookup("STOCKROOM_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            db_max_connections: parse_or(
                &lookup,
                "STOCKROOM_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            max_upload_bytes: parse_or(
                &lookup,
                "STOCKROOM_MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
            log_json: parse_or(&lookup, "STOCKROOM_LOG_JSON", defaults.log_json)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "STOCKROOM_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.bind_addr.port(), 8000);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("STOCKROOM_BIND_ADDR", "127.0.0.1:9000"),
            ("STOCKROOM_DATABASE_PATH", "/var/lib/stockroom/ledger.db"),
            ("STOCKROOM_MAX_UPLOAD_BYTES", "1024"),
            ("STOCKROOM_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/stockroom/ledger.db"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_values() {
        let err = ApiConfig::from_lookup(lookup(&[("STOCKROOM_DB_MAX_CONNECTIONS", "lots")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for STOCKROOM_DB_MAX_CONNECTIONS");

        assert!(ApiConfig::from_lookup(lookup(&[("STOCKROOM_DB_MAX_CONNECTIONS", "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("STOCKROOM_BIND_ADDR", "nowhere")])).is_err());
    }
}
