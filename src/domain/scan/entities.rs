//! Scan domain entities

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::PortRangeError;

/// How broadly a scan probes the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Common IoT service ports only
    Quick,
    /// The full configured port range
    Full,
    /// A single explicit target host
    Target,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Quick => write!(f, "quick"),
            ScanMode::Full => write!(f, "full"),
            ScanMode::Target => write!(f, "target"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(ScanMode::Quick),
            "full" => Ok(ScanMode::Full),
            "target" => Ok(ScanMode::Target),
            other => Err(format!("unknown scan mode: {other}")),
        }
    }
}

/// Lifecycle state of the scan job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Running,
    Stopping,
    Stopped,
    Completed,
    Failed,
}

impl JobState {
    /// True while the engine still owns a live scan task
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Running | JobState::Stopping)
    }
}

/// Record of the most recently started scan
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub scan_id: Uuid,
    pub mode: ScanMode,
    pub interface: Option<String>,
    pub target: Option<String>,
    pub port_range: Option<String>,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl ScanJob {
    pub fn new(
        scan_id: Uuid,
        mode: ScanMode,
        interface: Option<String>,
        target: Option<String>,
        port_range: Option<String>,
    ) -> Self {
        Self {
            scan_id,
            mode,
            interface,
            target,
            port_range,
            state: JobState::Running,
            started_at: Utc::now(),
            error: None,
        }
    }
}

/// Parameters handed to the engine when a scan starts
#[derive(Debug, Clone)]
pub struct ScanParams {
    pub mode: ScanMode,
    pub interface: Option<String>,
    pub target: Option<String>,
    pub port_range: Option<String>,
    pub max_threads: u32,
    pub save_reports: bool,
}

/// Engine-reported status of the current (or last) scan
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub scan_id: Option<Uuid>,
    pub state: JobState,
    /// 0.0..=1.0 fraction of targets processed
    pub progress: f32,
    pub current_phase: String,
    pub devices_found: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl EngineStatus {
    pub fn idle() -> Self {
        Self {
            scan_id: None,
            state: JobState::Idle,
            progress: 0.0,
            current_phase: "idle".to_string(),
            devices_found: 0,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }
}

/// An inclusive TCP port range such as "1-1000" or a single port "80"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Result<Self, PortRangeError> {
        if start == 0 {
            return Err(PortRangeError("port 0 is not scannable".to_string()));
        }
        if start > end {
            return Err(PortRangeError(format!(
                "start {start} is greater than end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn ports(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for PortRange {
    type Err = PortRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |p: &str| {
            p.trim()
                .parse::<u16>()
                .map_err(|_| PortRangeError(format!("'{p}' is not a valid port")))
        };
        match s.split_once('-') {
            Some((start, end)) => PortRange::new(parse(start)?, parse(end)?),
            None => {
                let port = parse(s)?;
                PortRange::new(port, port)
            }
        }
    }
}

/// Finding or log severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Log severity, mirroring the engine's log buffer levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One entry in the engine's capped log buffer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A local network interface usable for scanning
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NetworkInterface {
    pub name: String,
    pub ip: String,
    pub netmask: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    pub is_up: bool,
}

/// An open TCP port observed on a device
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PortInfo {
    pub port: u16,
    pub protocol: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// A device discovered on the network, keyed by IP address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Device {
    pub ip: String,
    pub mac: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    pub open_ports: Vec<PortInfo>,
    pub risk_level: Severity,
    pub vulnerabilities_count: usize,
    pub last_seen: DateTime<Utc>,
}

/// A vulnerability finding attributed to a device, keyed by identifier
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Vulnerability {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve_id: Option<String>,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub cvss_score: f32,
    pub affected_service: String,
    pub affected_port: u16,
    pub device_ip: String,
    /// 0.0..=1.0 confidence in the finding
    pub confidence: f32,
}

/// Severity breakdown over a result set
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ScanSummary {
    pub total_devices: usize,
    pub vulnerable_devices: usize,
    pub total_vulnerabilities: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub info_count: usize,
}

impl ScanSummary {
    pub fn from_findings(devices: &[Device], vulnerabilities: &[Vulnerability]) -> Self {
        let count = |s: Severity| vulnerabilities.iter().filter(|v| v.severity == s).count();
        Self {
            total_devices: devices.len(),
            vulnerable_devices: devices.iter().filter(|d| d.vulnerabilities_count > 0).count(),
            total_vulnerabilities: vulnerabilities.len(),
            critical_count: count(Severity::Critical),
            high_count: count(Severity::High),
            medium_count: count(Severity::Medium),
            low_count: count(Severity::Low),
            info_count: count(Severity::Info),
        }
    }
}

/// The latest available result set, partial while a scan runs
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub devices: Vec<Device>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub summary: ScanSummary,
}

impl ScanResults {
    pub fn empty() -> Self {
        Self {
            scan_id: None,
            timestamp: Utc::now(),
            duration_secs: 0.0,
            devices: Vec::new(),
            vulnerabilities: Vec::new(),
            summary: ScanSummary::default(),
        }
    }
}

/// Summary row for a saved report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportSummary {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub devices_count: usize,
    pub vulnerabilities_count: usize,
}

/// A saved report with the full result set it captured
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub results: ScanResults,
}

impl Report {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id,
            scan_id: self.scan_id,
            timestamp: self.timestamp,
            devices_count: self.results.devices.len(),
            vulnerabilities_count: self.results.vulnerabilities.len(),
        }
    }
}

/// Status descriptor of the AI classification subsystem
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiStatus {
    pub enabled: bool,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub devices_classified: usize,
    pub backend: String,
}
