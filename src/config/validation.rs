//! Configuration validation, run once at startup before anything binds

use std::str::FromStr;

use thiserror::Error;

use crate::domain::scan::entities::PortRange;

use super::{AuthConfig, Config, LoggingConfig, ScannerConfig, ServerConfig};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn invalid(message: impl Into<String>) -> ValidationError {
    ValidationError::Invalid(message.into())
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_seconds == 0 {
            return Err(invalid("server.request_timeout_seconds must be at least 1"));
        }
        if self.allowed_origins.is_empty() {
            return Err(invalid("server.allowed_origins must not be empty"));
        }
        Ok(())
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.password.is_empty() {
            return Err(invalid("auth.password must not be empty"));
        }
        Ok(())
    }
}

impl Validate for ScannerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_threads == 0 {
            return Err(invalid("scanner.max_threads must be at least 1"));
        }
        PortRange::from_str(&self.default_port_range)
            .map_err(|e| invalid(format!("scanner.default_port_range: {e}")))?;
        if self.probe_timeout_ms == 0 {
            return Err(invalid("scanner.probe_timeout_ms must be at least 1"));
        }
        if self.log_buffer_size == 0 {
            return Err(invalid("scanner.log_buffer_size must be at least 1"));
        }
        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(invalid(format!(
                "logging.format must be 'pretty' or 'json', got '{other}'"
            ))),
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.auth.validate()?;
        self.scanner.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_password_is_rejected() {
        let config = Config {
            auth: AuthConfig {
                password: String::new(),
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_port_range_is_rejected() {
        let config = Config {
            scanner: ScannerConfig {
                default_port_range: "9000-1".to_string(),
                ..ScannerConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let config = Config {
            logging: LoggingConfig {
                format: "xml".to_string(),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
