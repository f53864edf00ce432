//! Layered configuration
//!
//! Values come from `config/default.toml`, then an environment-specific file
//! chosen by `NETWARDEN_ENV`, then `config/local.toml`, then `NETWARDEN__`
//! prefixed environment variables. Every field has a default, so the service
//! starts with no files at all.

pub mod validation;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::scan::entities::{LogLevel, ScanMode};
use validation::{Validate, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_docs: bool,
    pub request_timeout_seconds: u64,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_docs: true,
            request_timeout_seconds: 30,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Initial shared password; rotatable at runtime through the API
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub default_interface: Option<String>,
    pub default_scan_mode: ScanMode,
    pub default_port_range: String,
    pub max_threads: u32,
    pub log_level: LogLevel,
    pub save_reports: bool,
    pub probe_timeout_ms: u64,
    pub log_buffer_size: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            default_interface: None,
            default_scan_mode: ScanMode::Quick,
            default_port_range: "1-1000".to_string(),
            max_threads: 10,
            log_level: LogLevel::Info,
            save_reports: true,
            probe_timeout_ms: 300,
            log_buffer_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigLoadError> {
        let run_env = std::env::var("NETWARDEN_ENV").unwrap_or_else(|_| "development".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_env}")).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("NETWARDEN").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
