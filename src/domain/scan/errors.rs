//! Scan domain errors

use thiserror::Error;

/// Failures surfaced by the scan engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("A scan is already running")]
    Busy,

    #[error("Scan engine failure: {0}")]
    Failure(String),
}

/// Rejected port range specifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid port range: {0}")]
pub struct PortRangeError(pub String);
