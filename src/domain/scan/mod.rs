//! Scan domain: entities, errors, and the engine interface

pub mod engine;
pub mod entities;
pub mod errors;

pub use engine::ScanEngine;
pub use entities::{
    AiStatus, Device, EngineStatus, JobState, LogEntry, LogLevel, NetworkInterface, PortInfo,
    PortRange, Report, ReportSummary, ScanJob, ScanMode, ScanParams, ScanResults, ScanSummary,
    Severity, Vulnerability,
};
pub use errors::{EngineError, PortRangeError};
