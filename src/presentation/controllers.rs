//! Request handlers
//!
//! Handlers decode transport input, call one application service and encode
//! the outcome. Status codes for failures come from [`ApiError`] alone.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::application::credentials::CredentialStore;
use crate::application::errors::ApplicationError;
use crate::application::jobs::{JobController, StartScan};
use crate::application::settings::{Settings, SettingsService};
use crate::config::Config;
use crate::domain::scan::entities::{
    AiStatus, Device, LogEntry, LogLevel, NetworkInterface, ReportSummary, ScanResults,
    Vulnerability,
};
use crate::domain::scan::engine::ScanEngine;
use crate::presentation::extractors::RequireAuth;
use crate::presentation::models::{
    ApiError, AuthRequest, AuthResponse, ErrorResponse, HealthResponse, LogsQuery,
    ScanStatusResponse, StartScanRequest, StartScanResponse, StopScanResponse,
    UpdatePasswordRequest, UpdatePasswordResponse,
};

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub jobs: Arc<JobController>,
    pub settings: Arc<SettingsService>,
    pub engine: Arc<dyn ScanEngine>,
    pub config: Arc<Config>,
    pub startup_time: Instant,
}

/// Check a password without creating any session state
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Password accepted", body = AuthResponse),
        (status = 401, description = "Password rejected", body = AuthResponse)
    ),
    tag = "auth"
)]
pub async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Response {
    if state.credentials.verify(&request.password).await {
        Json(AuthResponse {
            valid: true,
            error: None,
        })
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(AuthResponse {
                valid: false,
                error: Some("Invalid password".to_string()),
            }),
        )
            .into_response()
    }
}

/// List network interfaces usable for scanning
#[utoipa::path(
    get,
    path = "/api/interfaces",
    responses(
        (status = 200, description = "Available interfaces", body = [NetworkInterface]),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "scan"
)]
pub async fn list_interfaces(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<NetworkInterface>>, ApiError> {
    let interfaces = state.engine.list_interfaces().await.map_err(ApplicationError::from)?;
    Ok(Json(interfaces))
}

/// Start the background scan
#[utoipa::path(
    post,
    path = "/api/scan/start",
    request_body = StartScanRequest,
    responses(
        (status = 200, description = "Scan started", body = StartScanResponse),
        (status = 400, description = "Rejected parameters", body = ErrorResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse),
        (status = 500, description = "A scan is already running", body = ErrorResponse)
    ),
    tag = "scan"
)]
pub async fn start_scan(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<StartScanRequest>,
) -> Result<Json<StartScanResponse>, ApiError> {
    let scan_id = state
        .jobs
        .start(StartScan {
            mode: request.mode,
            interface: request.interface,
            target: request.target,
            port_range: request.port_range,
        })
        .await?;
    Ok(Json(StartScanResponse { scan_id }))
}

/// Progress of the current or most recent scan
#[utoipa::path(
    get,
    path = "/api/scan/status",
    responses(
        (status = 200, description = "Scan lifecycle status", body = ScanStatusResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "scan"
)]
pub async fn scan_status(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Json<ScanStatusResponse> {
    Json(state.jobs.status().await.into())
}

/// Latest available result set, partial while a scan runs
#[utoipa::path(
    get,
    path = "/api/scan/results",
    responses(
        (status = 200, description = "Scan results", body = ScanResults),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "scan"
)]
pub async fn scan_results(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Json<ScanResults> {
    Json(state.jobs.results().await)
}

/// Request the current scan stop; a no-op when nothing runs
#[utoipa::path(
    post,
    path = "/api/scan/stop",
    responses(
        (status = 200, description = "Stop acknowledged", body = StopScanResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "scan"
)]
pub async fn stop_scan(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Json<StopScanResponse> {
    state.jobs.stop().await;
    Json(StopScanResponse { stopped: true })
}

/// All devices discovered so far
#[utoipa::path(
    get,
    path = "/api/devices",
    responses(
        (status = 200, description = "Discovered devices", body = [Device]),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_devices(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Device>>, ApiError> {
    let devices = state.engine.list_devices().await.map_err(ApplicationError::from)?;
    Ok(Json(devices))
}

/// One device by IP address
#[utoipa::path(
    get,
    path = "/api/devices/{ip}",
    params(("ip" = String, Path, description = "Device IP address")),
    responses(
        (status = 200, description = "Device detail", body = Device),
        (status = 404, description = "No such device", body = ErrorResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_device(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<Device>, ApiError> {
    let device = state
        .engine
        .get_device(&ip)
        .await
        .map_err(ApplicationError::from)?
        .ok_or_else(|| ApplicationError::not_found("Device"))?;
    Ok(Json(device))
}

/// All vulnerability findings from the latest scan
#[utoipa::path(
    get,
    path = "/api/vulnerabilities",
    responses(
        (status = 200, description = "Vulnerability findings", body = [Vulnerability]),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_vulnerabilities(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Vulnerability>>, ApiError> {
    let vulnerabilities = state
        .engine
        .list_vulnerabilities()
        .await
        .map_err(ApplicationError::from)?;
    Ok(Json(vulnerabilities))
}

/// Saved report summaries
#[utoipa::path(
    get,
    path = "/api/reports",
    responses(
        (status = 200, description = "Saved reports", body = [ReportSummary]),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportSummary>>, ApiError> {
    let reports = state.engine.list_reports().await.map_err(ApplicationError::from)?;
    Ok(Json(reports))
}

/// One saved report in full
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(("id" = String, Path, description = "Report identifier")),
    responses(
        (status = 200, description = "Report detail", body = crate::domain::scan::entities::Report),
        (status = 404, description = "No such report", body = ErrorResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn get_report(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<crate::domain::scan::entities::Report>, ApiError> {
    let report = state
        .engine
        .get_report(&id)
        .await
        .map_err(ApplicationError::from)?
        .ok_or_else(|| ApplicationError::not_found("Report"))?;
    Ok(Json(report))
}

/// One saved report as a file attachment
#[utoipa::path(
    get,
    path = "/api/reports/{id}/download",
    params(("id" = String, Path, description = "Report identifier")),
    responses(
        (status = 200, description = "Report attachment", body = crate::domain::scan::entities::Report),
        (status = 404, description = "No such report", body = ErrorResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn download_report(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let report = state
        .engine
        .get_report(&id)
        .await
        .map_err(ApplicationError::from)?
        .ok_or_else(|| ApplicationError::not_found("Report"))?;

    let disposition = format!("attachment; filename=report-{}.json", report.id);
    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        Json(report),
    )
        .into_response())
}

/// Engine log entries, optionally filtered by level
#[utoipa::path(
    get,
    path = "/api/logs",
    params(("level" = Option<String>, Query, description = "Exact level filter")),
    responses(
        (status = 200, description = "Log entries, most recent last", body = [LogEntry]),
        (status = 400, description = "Unknown level", body = ErrorResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "observability"
)]
pub async fn get_logs(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let level = query
        .level
        .map(|raw| LogLevel::from_str(&raw).map_err(ApplicationError::bad_request))
        .transpose()?;
    Ok(Json(state.engine.get_logs(level).await))
}

/// Status of the device classification subsystem
#[utoipa::path(
    get,
    path = "/api/ai/status",
    responses(
        (status = 200, description = "Classifier status", body = AiStatus),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "observability"
)]
pub async fn ai_status(_auth: RequireAuth, State(state): State<AppState>) -> Json<AiStatus> {
    Json(state.engine.ai_status().await)
}

/// Current scanner defaults
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Current settings", body = Settings),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "settings"
)]
pub async fn get_settings(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Json<Settings> {
    Json(state.settings.snapshot().await)
}

/// Update a subset of the recognized settings keys, echoing the accepted
/// mapping back
#[utoipa::path(
    put,
    path = "/api/settings",
    responses(
        (status = 200, description = "The accepted mapping"),
        (status = 400, description = "Unknown key or rejected value", body = ErrorResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "settings"
)]
pub async fn update_settings(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Json(changes): Json<serde_json::Map<String, Value>>,
) -> Result<Json<serde_json::Map<String, Value>>, ApiError> {
    state.settings.update(&changes).await?;
    Ok(Json(changes))
}

/// Rotate the shared password
#[utoipa::path(
    post,
    path = "/api/settings/password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password rotated", body = UpdatePasswordResponse),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse),
        (status = 401, description = "Missing or wrong password", body = ErrorResponse)
    ),
    tag = "settings"
)]
pub async fn update_password(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<Json<UpdatePasswordResponse>, ApiError> {
    state
        .credentials
        .replace(&request.old_password, request.new_password)
        .await
        .map_err(|e| ApplicationError::bad_request(e.to_string()))?;
    tracing::info!("shared password rotated");
    Ok(Json(UpdatePasswordResponse { updated: true }))
}

/// Liveness probe, outside the password gate
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.startup_time.elapsed().as_secs(),
    })
}
