//! In-process scan engine
//!
//! Discovers devices with bounded TCP connect probes, derives vulnerability
//! findings from the services it sees, and keeps results, saved reports and a
//! capped log buffer in memory. One scan task runs at a time; a cancellation
//! token tears it down cooperatively.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pnet::datalink;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ScannerConfig;
use crate::domain::scan::entities::{
    AiStatus, Device, EngineStatus, JobState, LogEntry, LogLevel, NetworkInterface, PortInfo,
    PortRange, Report, ReportSummary, ScanMode, ScanParams, ScanResults, ScanSummary, Severity,
    Vulnerability,
};
use crate::domain::scan::engine::ScanEngine;
use crate::domain::scan::errors::EngineError;

/// Ports worth probing on a quick pass over consumer networks
const QUICK_SCAN_PORTS: &[u16] = &[
    21, 22, 23, 53, 80, 81, 443, 554, 1883, 2323, 5683, 7547, 8080, 8443, 8883, 8888, 9100,
];

pub struct LocalScanEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    status: RwLock<EngineStatus>,
    devices: RwLock<HashMap<String, Device>>,
    vulnerabilities: RwLock<Vec<Vulnerability>>,
    reports: RwLock<Vec<Report>>,
    logs: Mutex<VecDeque<LogEntry>>,
    cancel: Mutex<Option<CancellationToken>>,
    devices_classified: AtomicUsize,
    log_capacity: usize,
    probe_timeout: Duration,
}

impl LocalScanEngine {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                status: RwLock::new(EngineStatus::idle()),
                devices: RwLock::new(HashMap::new()),
                vulnerabilities: RwLock::new(Vec::new()),
                reports: RwLock::new(Vec::new()),
                logs: Mutex::new(VecDeque::new()),
                cancel: Mutex::new(None),
                devices_classified: AtomicUsize::new(0),
                log_capacity: config.log_buffer_size,
                probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            }),
        }
    }
}

#[async_trait]
impl ScanEngine for LocalScanEngine {
    async fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, EngineError> {
        Ok(usable_interfaces())
    }

    async fn start_scan(&self, params: ScanParams) -> Result<Uuid, EngineError> {
        let scan_id = {
            let mut status = self.inner.status.write().await;
            if status.state.is_active() {
                return Err(EngineError::Busy);
            }
            let scan_id = Uuid::new_v4();
            *status = EngineStatus {
                scan_id: Some(scan_id),
                state: JobState::Running,
                progress: 0.0,
                current_phase: "host discovery".to_string(),
                devices_found: 0,
                started_at: Some(Utc::now()),
                finished_at: None,
                error: None,
            };
            scan_id
        };

        self.inner.devices.write().await.clear();
        self.inner.vulnerabilities.write().await.clear();

        let token = CancellationToken::new();
        *self.inner.cancel.lock().await = Some(token.clone());

        self.inner
            .log(
                LogLevel::Info,
                format!("Scan {scan_id} started in {} mode", params.mode),
            )
            .await;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_scan(scan_id, params, token).await;
        });

        Ok(scan_id)
    }

    async fn scan_status(&self) -> EngineStatus {
        self.inner.status.read().await.clone()
    }

    async fn scan_results(&self) -> ScanResults {
        self.inner.assemble_results().await
    }

    async fn stop_scan(&self) {
        let token = self.inner.cancel.lock().await.clone();
        if let Some(token) = token {
            token.cancel();
        }
        let mut status = self.inner.status.write().await;
        if status.state == JobState::Running {
            status.state = JobState::Stopping;
            status.current_phase = "stopping".to_string();
        }
    }

    async fn list_devices(&self) -> Result<Vec<Device>, EngineError> {
        let devices = self.inner.devices.read().await;
        let mut list: Vec<Device> = devices.values().cloned().collect();
        list.sort_by(|a, b| a.ip.cmp(&b.ip));
        Ok(list)
    }

    async fn get_device(&self, ip: &str) -> Result<Option<Device>, EngineError> {
        Ok(self.inner.devices.read().await.get(ip).cloned())
    }

    async fn list_vulnerabilities(&self) -> Result<Vec<Vulnerability>, EngineError> {
        Ok(self.inner.vulnerabilities.read().await.clone())
    }

    async fn list_reports(&self) -> Result<Vec<ReportSummary>, EngineError> {
        let reports = self.inner.reports.read().await;
        Ok(reports.iter().map(Report::summary).collect())
    }

    async fn get_report(&self, id: &str) -> Result<Option<Report>, EngineError> {
        // parse rather than string-compare so uppercase-hex ids still match
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let reports = self.inner.reports.read().await;
        Ok(reports.iter().find(|r| r.id == id).cloned())
    }

    async fn get_logs(&self, level: Option<LogLevel>) -> Vec<LogEntry> {
        let logs = self.inner.logs.lock().await;
        match level {
            Some(level) => logs.iter().filter(|e| e.level == level).cloned().collect(),
            None => logs.iter().cloned().collect(),
        }
    }

    async fn ai_status(&self) -> AiStatus {
        AiStatus {
            enabled: true,
            model_loaded: false,
            model_version: None,
            devices_classified: self.inner.devices_classified.load(Ordering::Relaxed),
            backend: "heuristic".to_string(),
        }
    }
}

impl EngineInner {
    async fn run_scan(self: Arc<Self>, scan_id: Uuid, params: ScanParams, token: CancellationToken) {
        let targets = match self.resolve_targets(&params).await {
            Ok(targets) => targets,
            Err(reason) => {
                self.log(LogLevel::Error, reason.clone()).await;
                self.finish(JobState::Failed, Some(reason)).await;
                return;
            }
        };

        let ports = match scan_ports(&params) {
            Ok(ports) => ports,
            Err(reason) => {
                self.log(LogLevel::Error, reason.clone()).await;
                self.finish(JobState::Failed, Some(reason)).await;
                return;
            }
        };

        self.set_phase("port scan").await;
        self.log(
            LogLevel::Info,
            format!(
                "Probing {} host(s) across {} port(s)",
                targets.len(),
                ports.len()
            ),
        )
        .await;

        let semaphore = Arc::new(Semaphore::new(params.max_threads.max(1) as usize));
        let total = targets.len();

        for (done, host) in targets.iter().enumerate() {
            if token.is_cancelled() {
                break;
            }

            let open_ports = self
                .probe_host(host, &ports, &semaphore, &token)
                .await;

            if !open_ports.is_empty() {
                let device = self.classify(host, &open_ports).await;
                self.log(
                    LogLevel::Info,
                    format!(
                        "Device {} up, {} open port(s), {} finding(s)",
                        host,
                        device.open_ports.len(),
                        device.vulnerabilities_count
                    ),
                )
                .await;
                self.devices
                    .write()
                    .await
                    .insert(host.clone(), device);
                self.devices_classified.fetch_add(1, Ordering::Relaxed);
            }

            let mut status = self.status.write().await;
            status.progress = (done + 1) as f32 / total as f32;
            status.devices_found = self.devices.read().await.len();
        }

        if token.is_cancelled() {
            self.log(LogLevel::Warning, format!("Scan {scan_id} stopped")).await;
            self.finish(JobState::Stopped, None).await;
            return;
        }

        self.set_phase("vulnerability analysis").await;
        let summary = {
            let devices: Vec<Device> = self.devices.read().await.values().cloned().collect();
            let vulns = self.vulnerabilities.read().await;
            ScanSummary::from_findings(&devices, &vulns)
        };
        self.log(
            LogLevel::Info,
            format!(
                "Scan {scan_id} found {} device(s) and {} vulnerability(ies)",
                summary.total_devices, summary.total_vulnerabilities
            ),
        )
        .await;

        if params.save_reports {
            self.set_phase("reporting").await;
            self.finish(JobState::Completed, None).await;
            let results = self.assemble_results().await;
            let report = Report {
                id: Uuid::new_v4(),
                scan_id,
                timestamp: Utc::now(),
                results,
            };
            self.log(LogLevel::Info, format!("Report {} saved", report.id)).await;
            self.reports.write().await.push(report);
        } else {
            self.finish(JobState::Completed, None).await;
        }
    }

    /// Expand the request into the host list to probe: an explicit target, or
    /// the /24 around the scanning interface's address.
    async fn resolve_targets(&self, params: &ScanParams) -> Result<Vec<String>, String> {
        if let Some(target) = &params.target {
            return Ok(vec![target.clone()]);
        }

        let interfaces = usable_interfaces();
        let iface = match &params.interface {
            Some(name) => interfaces.iter().find(|i| &i.name == name),
            None => interfaces.first(),
        }
        .ok_or_else(|| "No usable network interface for scanning".to_string())?;

        let ip = IpAddr::from_str(&iface.ip)
            .map_err(|_| format!("Interface {} has no scannable address", iface.name))?;
        match ip {
            IpAddr::V4(v4) => {
                let [a, b, c, _] = v4.octets();
                Ok((1..=254).map(|d| format!("{a}.{b}.{c}.{d}")).collect())
            }
            IpAddr::V6(_) => Err(format!(
                "Interface {} only has an IPv6 address; subnet sweep needs IPv4",
                iface.name
            )),
        }
    }

    async fn probe_host(
        &self,
        host: &str,
        ports: &[u16],
        semaphore: &Arc<Semaphore>,
        token: &CancellationToken,
    ) -> Vec<u16> {
        let mut set = JoinSet::new();
        for &port in ports {
            if token.is_cancelled() {
                break;
            }
            let Ok(permit) = Arc::clone(semaphore).acquire_owned().await else {
                break;
            };
            let addr = format!("{host}:{port}");
            let timeout = self.probe_timeout;
            set.spawn(async move {
                let _permit = permit;
                let connected = matches!(
                    tokio::time::timeout(timeout, TcpStream::connect(&addr)).await,
                    Ok(Ok(_))
                );
                connected.then_some(port)
            });
        }

        let mut open = Vec::new();
        while let Some(joined) = set.join_next().await {
            if let Ok(Some(port)) = joined {
                open.push(port);
            }
        }
        open.sort_unstable();
        open
    }

    /// Build a device record from its open ports and record the findings the
    /// exposed services imply.
    async fn classify(&self, host: &str, open_ports: &[u16]) -> Device {
        let port_info: Vec<PortInfo> = open_ports
            .iter()
            .map(|&port| PortInfo {
                port,
                protocol: "tcp".to_string(),
                state: "open".to_string(),
                service: service_name(port).map(str::to_string),
            })
            .collect();

        let findings = derive_vulnerabilities(host, open_ports);
        let risk_level = findings
            .iter()
            .map(|v| v.severity)
            .max()
            .unwrap_or(Severity::Info);
        let vulnerabilities_count = findings.len();
        self.vulnerabilities.write().await.extend(findings);

        Device {
            ip: host.to_string(),
            mac: "unknown".to_string(),
            hostname: None,
            vendor: None,
            device_type: Some(device_type(open_ports).to_string()),
            open_ports: port_info,
            risk_level,
            vulnerabilities_count,
            last_seen: Utc::now(),
        }
    }

    async fn assemble_results(&self) -> ScanResults {
        let status = self.status.read().await.clone();
        let mut devices: Vec<Device> = self.devices.read().await.values().cloned().collect();
        devices.sort_by(|a, b| a.ip.cmp(&b.ip));
        let vulnerabilities = self.vulnerabilities.read().await.clone();
        let summary = ScanSummary::from_findings(&devices, &vulnerabilities);

        let duration_secs = match (status.started_at, status.finished_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            (Some(start), None) => (Utc::now() - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        };

        ScanResults {
            scan_id: status.scan_id,
            timestamp: Utc::now(),
            duration_secs,
            devices,
            vulnerabilities,
            summary,
        }
    }

    async fn set_phase(&self, phase: &str) {
        self.status.write().await.current_phase = phase.to_string();
    }

    async fn finish(&self, state: JobState, error: Option<String>) {
        let mut status = self.status.write().await;
        status.state = state;
        status.error = error;
        status.finished_at = Some(Utc::now());
        status.current_phase = "done".to_string();
        if state == JobState::Completed {
            status.progress = 1.0;
        }
    }

    async fn log(&self, level: LogLevel, message: String) {
        let mut logs = self.logs.lock().await;
        if logs.len() == self.log_capacity {
            logs.pop_front();
        }
        logs.push_back(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
            source: Some("engine".to_string()),
        });
    }
}

fn scan_ports(params: &ScanParams) -> Result<Vec<u16>, String> {
    if params.mode == ScanMode::Quick {
        return Ok(QUICK_SCAN_PORTS.to_vec());
    }
    let raw = params.port_range.as_deref().unwrap_or("1-1000");
    let range = PortRange::from_str(raw).map_err(|e| e.to_string())?;
    Ok(range.ports().collect())
}

/// Interfaces with an IPv4 address, loopback excluded.
fn usable_interfaces() -> Vec<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter_map(|iface| {
            let network = iface.ips.iter().find(|ip| ip.is_ipv4())?;
            Some(NetworkInterface {
                name: iface.name.clone(),
                ip: network.ip().to_string(),
                netmask: network.mask().to_string(),
                mac: iface.mac.map(|m| m.to_string()),
                is_up: iface.is_up(),
            })
        })
        .collect()
}

fn service_name(port: u16) -> Option<&'static str> {
    Some(match port {
        21 => "ftp",
        22 => "ssh",
        23 | 2323 => "telnet",
        53 => "dns",
        80 | 81 | 8080 | 8888 => "http",
        443 | 8443 => "https",
        554 => "rtsp",
        1883 => "mqtt",
        5683 => "coap",
        7547 => "cwmp",
        8883 => "mqtts",
        9100 => "jetdirect",
        _ => return None,
    })
}

fn device_type(open_ports: &[u16]) -> &'static str {
    let has = |p: u16| open_ports.contains(&p);
    if has(554) {
        "camera"
    } else if has(9100) {
        "printer"
    } else if has(1883) || has(5683) || has(8883) {
        "iot_hub"
    } else if has(7547) || (has(53) && has(80)) {
        "router"
    } else if has(22) && !has(80) {
        "server"
    } else {
        "unknown"
    }
}

/// Findings implied by the services a device exposes.
fn derive_vulnerabilities(host: &str, open_ports: &[u16]) -> Vec<Vulnerability> {
    let mut findings = Vec::new();
    let has = |p: u16| open_ports.contains(&p);

    let mut push = |title: &str,
                    description: &str,
                    severity: Severity,
                    cvss_score: f32,
                    service: &str,
                    port: u16,
                    confidence: f32| {
        findings.push(Vulnerability {
            id: Uuid::new_v4(),
            cve_id: None,
            title: title.to_string(),
            description: description.to_string(),
            severity,
            cvss_score,
            affected_service: service.to_string(),
            affected_port: port,
            device_ip: host.to_string(),
            confidence,
        });
    };

    for &port in open_ports {
        match port {
            23 | 2323 => push(
                "Telnet service exposed",
                "Telnet transmits credentials in cleartext and is a common IoT botnet entry point.",
                Severity::High,
                8.1,
                "telnet",
                port,
                0.9,
            ),
            21 => push(
                "FTP service exposed",
                "FTP transmits credentials in cleartext; anonymous access may be enabled.",
                Severity::Medium,
                5.3,
                "ftp",
                port,
                0.7,
            ),
            554 => push(
                "RTSP stream reachable",
                "The video stream may be viewable without authentication.",
                Severity::Medium,
                5.3,
                "rtsp",
                port,
                0.6,
            ),
            1883 => push(
                "MQTT broker without TLS",
                "Unencrypted MQTT allows eavesdropping on device telemetry and commands.",
                Severity::Medium,
                5.9,
                "mqtt",
                port,
                0.8,
            ),
            5683 => push(
                "CoAP endpoint reachable",
                "Exposed CoAP endpoints can leak device state and amplify traffic.",
                Severity::Info,
                3.1,
                "coap",
                port,
                0.5,
            ),
            7547 => push(
                "TR-069 management port open",
                "CWMP remote management has a history of remotely exploitable flaws.",
                Severity::High,
                7.5,
                "cwmp",
                port,
                0.7,
            ),
            _ => {}
        }
    }

    if (has(80) || has(81) || has(8080)) && !(has(443) || has(8443)) {
        let port = [80u16, 81, 8080]
            .into_iter()
            .find(|p| has(*p))
            .unwrap_or(80);
        push(
            "Unencrypted web interface",
            "The device serves its administration interface over plain HTTP only.",
            Severity::Medium,
            5.3,
            "http",
            port,
            0.8,
        );
    }

    findings
}
