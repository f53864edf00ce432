//! Runtime settings facade
//!
//! A bounded mapping of named scanner defaults, read by the job controller
//! when a start request leaves a parameter unsupplied. Updates accept any
//! subset of the recognized keys; unknown keys and wrong-typed values are
//! rejected outright rather than silently absorbed.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::application::errors::ApplicationError;
use crate::config::ScannerConfig;
use crate::domain::scan::entities::{LogLevel, PortRange, ScanMode};

/// Current scanner defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Settings {
    pub default_interface: Option<String>,
    pub default_scan_mode: ScanMode,
    pub default_port_range: String,
    pub max_threads: u32,
    pub log_level: LogLevel,
    pub save_reports: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_interface: None,
            default_scan_mode: ScanMode::Quick,
            default_port_range: "1-1000".to_string(),
            max_threads: 10,
            log_level: LogLevel::Info,
            save_reports: true,
        }
    }
}

impl From<&ScannerConfig> for Settings {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            default_interface: config.default_interface.clone(),
            default_scan_mode: config.default_scan_mode,
            default_port_range: config.default_port_range.clone(),
            max_threads: config.max_threads,
            log_level: config.log_level,
            save_reports: config.save_reports,
        }
    }
}

pub struct SettingsService {
    current: RwLock<Settings>,
}

impl SettingsService {
    pub fn new(initial: Settings) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub async fn snapshot(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Apply a partial mapping of recognized keys. The write lock is held
    /// across stage and apply, so concurrent updates serialize and none can
    /// overwrite another's accepted keys. All values are validated before any
    /// is applied, so a rejected request changes nothing.
    pub async fn update(
        &self,
        changes: &serde_json::Map<String, Value>,
    ) -> Result<(), ApplicationError> {
        let mut current = self.current.write().await;
        let mut staged = current.clone();
        for (key, value) in changes {
            apply_one(&mut staged, key, value)?;
        }
        *current = staged;
        Ok(())
    }
}

fn apply_one(settings: &mut Settings, key: &str, value: &Value) -> Result<(), ApplicationError> {
    match key {
        "default_interface" => {
            settings.default_interface = match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                _ => return Err(type_error(key, "a string or null")),
            };
        }
        "default_scan_mode" => {
            let raw = value.as_str().ok_or_else(|| type_error(key, "a string"))?;
            settings.default_scan_mode = ScanMode::from_str(raw)
                .map_err(|e| ApplicationError::bad_request(format!("{key}: {e}")))?;
        }
        "default_port_range" => {
            let raw = value.as_str().ok_or_else(|| type_error(key, "a string"))?;
            let range: PortRange = raw
                .parse()
                .map_err(|e| ApplicationError::bad_request(format!("{key}: {e}")))?;
            settings.default_port_range = range.to_string();
        }
        "max_threads" => {
            let n = value.as_u64().ok_or_else(|| type_error(key, "a positive integer"))?;
            if n == 0 || n > u32::MAX as u64 {
                return Err(type_error(key, "a positive integer"));
            }
            settings.max_threads = n as u32;
        }
        "log_level" => {
            let raw = value.as_str().ok_or_else(|| type_error(key, "a string"))?;
            settings.log_level = LogLevel::from_str(raw)
                .map_err(|e| ApplicationError::bad_request(format!("{key}: {e}")))?;
        }
        "save_reports" => {
            settings.save_reports = value
                .as_bool()
                .ok_or_else(|| type_error(key, "a boolean"))?;
        }
        other => {
            return Err(ApplicationError::bad_request(format!(
                "Unknown settings key: {other}"
            )));
        }
    }
    Ok(())
}

fn type_error(key: &str, expected: &str) -> ApplicationError {
    ApplicationError::bad_request(format!("{key} must be {expected}"))
}
