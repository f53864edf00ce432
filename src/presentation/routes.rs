//! Router assembly and OpenAPI document

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::presentation::controllers::{self, AppState};
use crate::presentation::extractors::{inject_auth_state, AUTH_PASSWORD_HEADER};

#[derive(OpenApi)]
#[openapi(
    paths(
        controllers::authenticate,
        controllers::list_interfaces,
        controllers::start_scan,
        controllers::scan_status,
        controllers::scan_results,
        controllers::stop_scan,
        controllers::list_devices,
        controllers::get_device,
        controllers::list_vulnerabilities,
        controllers::list_reports,
        controllers::get_report,
        controllers::download_report,
        controllers::get_logs,
        controllers::ai_status,
        controllers::get_settings,
        controllers::update_settings,
        controllers::update_password,
        controllers::health_check,
    ),
    components(schemas(
        crate::presentation::models::ErrorResponse,
        crate::presentation::models::AuthRequest,
        crate::presentation::models::AuthResponse,
        crate::presentation::models::StartScanRequest,
        crate::presentation::models::StartScanResponse,
        crate::presentation::models::ScanStatusResponse,
        crate::presentation::models::StopScanResponse,
        crate::presentation::models::UpdatePasswordRequest,
        crate::presentation::models::UpdatePasswordResponse,
        crate::presentation::models::HealthResponse,
        crate::application::settings::Settings,
        crate::domain::scan::entities::ScanMode,
        crate::domain::scan::entities::JobState,
        crate::domain::scan::entities::Severity,
        crate::domain::scan::entities::LogLevel,
        crate::domain::scan::entities::LogEntry,
        crate::domain::scan::entities::NetworkInterface,
        crate::domain::scan::entities::PortInfo,
        crate::domain::scan::entities::Device,
        crate::domain::scan::entities::Vulnerability,
        crate::domain::scan::entities::ScanSummary,
        crate::domain::scan::entities::ScanResults,
        crate::domain::scan::entities::ReportSummary,
        crate::domain::scan::entities::Report,
        crate::domain::scan::entities::AiStatus,
    )),
    info(
        title = "netwarden",
        description = "Password-gated control plane for a local IoT security scanner"
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/auth", post(controllers::authenticate))
        .route("/interfaces", get(controllers::list_interfaces))
        .route("/scan/start", post(controllers::start_scan))
        .route("/scan/status", get(controllers::scan_status))
        .route("/scan/results", get(controllers::scan_results))
        .route("/scan/stop", post(controllers::stop_scan))
        .route("/devices", get(controllers::list_devices))
        .route("/devices/{ip}", get(controllers::get_device))
        .route("/vulnerabilities", get(controllers::list_vulnerabilities))
        .route("/reports", get(controllers::list_reports))
        .route("/reports/{id}", get(controllers::get_report))
        .route("/reports/{id}/download", get(controllers::download_report))
        .route("/logs", get(controllers::get_logs))
        .route("/ai/status", get(controllers::ai_status))
        .route(
            "/settings",
            get(controllers::get_settings).put(controllers::update_settings),
        )
        .route("/settings/password", post(controllers::update_password));

    let mut router = Router::new()
        .nest("/api", api)
        .route("/health", get(controllers::health_check));

    if config.server.enable_docs {
        router = router
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_auth_state,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_seconds,
                ))),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = &config.server.allowed_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(AUTH_PASSWORD_HEADER),
        ])
}
