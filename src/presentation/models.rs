//! API request/response models and the single error translation point

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::application::jobs::JobStatus;
use crate::domain::scan::entities::{JobState, ScanMode};
use crate::domain::scan::errors::EngineError;

/// Error body shared by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Transport wrapper turning application errors into status codes. Handlers
/// return `Result<_, ApiError>` and never pick status codes themselves.
#[derive(Debug)]
pub struct ApiError(pub ApplicationError);

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ApplicationError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApplicationError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApplicationError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApplicationError::Engine(engine) => {
                match engine {
                    EngineError::Busy => {}
                    EngineError::Failure(reason) => {
                        tracing::error!(error = %reason, "scan engine failure");
                    }
                }
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartScanRequest {
    #[serde(default)]
    pub mode: Option<ScanMode>,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub port_range: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartScanResponse {
    pub scan_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanStatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<Uuid>,
    pub state: JobState,
    pub progress: f32,
    pub current_phase: String,
    pub devices_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JobStatus> for ScanStatusResponse {
    fn from(status: JobStatus) -> Self {
        Self {
            scan_id: status.scan_id,
            state: status.state,
            progress: status.progress,
            current_phase: status.current_phase,
            devices_found: status.devices_found,
            started_at: status.started_at,
            error: status.error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StopScanResponse {
    pub stopped: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePasswordResponse {
    pub updated: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
