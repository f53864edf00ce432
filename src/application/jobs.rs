//! Single-scan job controller
//!
//! The control plane owns at most one scan at a time. The controller keeps the
//! record of the most recently started scan behind a mutex held across the
//! engine delegation, so concurrent start requests serialize and exactly one
//! can win while a scan is live.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::application::settings::SettingsService;
use crate::domain::scan::entities::{
    JobState, PortRange, ScanJob, ScanMode, ScanParams, ScanResults,
};
use crate::domain::scan::engine::ScanEngine;
use crate::domain::scan::errors::EngineError;

/// A start request after transport decoding, before defaults are applied
#[derive(Debug, Clone, Default)]
pub struct StartScan {
    pub mode: Option<ScanMode>,
    pub interface: Option<String>,
    pub target: Option<String>,
    pub port_range: Option<String>,
}

/// Control-plane view of the scan lifecycle, merged from the stored job
/// record and the engine's live status
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub scan_id: Option<Uuid>,
    pub state: JobState,
    pub progress: f32,
    pub current_phase: String,
    pub devices_found: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl JobStatus {
    pub fn idle() -> Self {
        Self {
            scan_id: None,
            state: JobState::Idle,
            progress: 0.0,
            current_phase: "idle".to_string(),
            devices_found: 0,
            started_at: None,
            error: None,
        }
    }
}

pub struct JobController {
    engine: Arc<dyn ScanEngine>,
    settings: Arc<SettingsService>,
    current: Mutex<Option<ScanJob>>,
}

impl JobController {
    pub fn new(engine: Arc<dyn ScanEngine>, settings: Arc<SettingsService>) -> Self {
        Self {
            engine,
            settings,
            current: Mutex::new(None),
        }
    }

    /// Start a scan, filling unsupplied parameters from the settings facade.
    /// Returns the new scan identifier, or [`EngineError::Busy`] while one is
    /// already live.
    pub async fn start(&self, request: StartScan) -> Result<Uuid, ApplicationError> {
        let mut current = self.current.lock().await;

        // Refresh the stored record before gating; the engine drives state
        // transitions and may have finished since we last looked.
        if let Some(job) = current.as_mut() {
            let status = self.engine.scan_status().await;
            if status.scan_id == Some(job.scan_id) {
                job.state = status.state;
                job.error = status.error;
            }
            if job.state.is_active() {
                return Err(EngineError::Busy.into());
            }
        }

        let defaults = self.settings.snapshot().await;
        let mode = request.mode.unwrap_or(defaults.default_scan_mode);
        let interface = request.interface.or(defaults.default_interface);
        let target = request.target;
        let port_range = match request.port_range {
            Some(raw) => {
                let parsed: PortRange = PortRange::from_str(&raw)
                    .map_err(|e| ApplicationError::bad_request(e.to_string()))?;
                Some(parsed.to_string())
            }
            None => Some(defaults.default_port_range.clone()),
        };

        if mode == ScanMode::Target && target.is_none() {
            return Err(ApplicationError::bad_request(
                "target mode requires a target host",
            ));
        }

        let params = ScanParams {
            mode,
            interface: interface.clone(),
            target: target.clone(),
            port_range: port_range.clone(),
            max_threads: defaults.max_threads,
            save_reports: defaults.save_reports,
        };

        let scan_id = self.engine.start_scan(params).await?;
        *current = Some(ScanJob::new(scan_id, mode, interface, target, port_range));

        tracing::info!(%scan_id, %mode, "scan started");
        Ok(scan_id)
    }

    /// Current lifecycle status. Idle until the first start of the process
    /// lifetime; afterwards reflects the engine's view of the last scan.
    pub async fn status(&self) -> JobStatus {
        let mut current = self.current.lock().await;
        let job = match current.as_mut() {
            Some(job) => job,
            None => return JobStatus::idle(),
        };

        let status = self.engine.scan_status().await;
        if status.scan_id == Some(job.scan_id) {
            job.state = status.state;
            job.error = status.error.clone();
        }

        JobStatus {
            scan_id: Some(job.scan_id),
            state: job.state,
            progress: status.progress,
            current_phase: status.current_phase,
            devices_found: status.devices_found,
            started_at: Some(job.started_at),
            error: job.error.clone(),
        }
    }

    /// Request the current scan stop. Idempotent: stopping with nothing
    /// running is a successful no-op.
    pub async fn stop(&self) {
        let mut current = self.current.lock().await;
        self.engine.stop_scan().await;
        if let Some(job) = current.as_mut() {
            if job.state == JobState::Running {
                job.state = JobState::Stopping;
                tracing::info!(scan_id = %job.scan_id, "scan stop requested");
            }
        }
    }

    /// Latest available result set from the engine.
    pub async fn results(&self) -> ScanResults {
        self.engine.scan_results().await
    }
}
