//! The scan engine interface consumed by the control plane
//!
//! The engine owns device discovery, vulnerability detection, report storage,
//! and the log buffer. The control plane only drives the lifecycle of its one
//! scan and projects the collections it holds.

use async_trait::async_trait;
use uuid::Uuid;

use super::entities::{
    AiStatus, Device, EngineStatus, LogEntry, LogLevel, NetworkInterface, Report, ReportSummary,
    ScanParams, ScanResults, Vulnerability,
};
use super::errors::EngineError;

#[async_trait]
pub trait ScanEngine: Send + Sync {
    /// Enumerate interfaces usable for scanning.
    async fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, EngineError>;

    /// Begin a scan and return its identifier. Fails with [`EngineError::Busy`]
    /// while a scan is live; never waits for scan completion.
    async fn start_scan(&self, params: ScanParams) -> Result<Uuid, EngineError>;

    /// Latest known status of the current or most recent scan. Never blocks on
    /// scan progress.
    async fn scan_status(&self) -> EngineStatus;

    /// Latest available result set: partial while running, final afterwards.
    async fn scan_results(&self) -> ScanResults;

    /// Request the current scan stop. No-op when nothing is running; does not
    /// wait for teardown.
    async fn stop_scan(&self);

    async fn list_devices(&self) -> Result<Vec<Device>, EngineError>;

    async fn get_device(&self, ip: &str) -> Result<Option<Device>, EngineError>;

    async fn list_vulnerabilities(&self) -> Result<Vec<Vulnerability>, EngineError>;

    async fn list_reports(&self) -> Result<Vec<ReportSummary>, EngineError>;

    async fn get_report(&self, id: &str) -> Result<Option<Report>, EngineError>;

    /// Log entries in insertion order, most recent last, optionally filtered
    /// by severity.
    async fn get_logs(&self, level: Option<LogLevel>) -> Vec<LogEntry>;

    async fn ai_status(&self) -> AiStatus;
}
