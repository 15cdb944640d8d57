//! Environment configuration

use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the persisted cart record.
    pub storage_dir: PathBuf,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 8083, storage_dir: PathBuf::from(".relieve"), log_format: LogFormat::Pretty }
    }
}

impl AppConfig {
    /// Reads `HOST`, `PORT`, `CART_STORAGE_DIR` and `LOG_FORMAT`, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::Invalid { var: "PORT", reason: e.to_string() })?,
            None => defaults.port,
        };
        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid { var: "LOG_FORMAT", reason: format!("expected pretty or json, got {other}") })
            }
        };
        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            storage_dir: lookup("CART_STORAGE_DIR").map(PathBuf::from).unwrap_or(defaults.storage_dir),
            log_format,
        })
    }

    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}
