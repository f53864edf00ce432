//! Router-level tests driving the full middleware and handler stack through
//! `tower::ServiceExt::oneshot` against a mock engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::application::credentials::CredentialStore;
use crate::application::jobs::JobController;
use crate::application::settings::{Settings, SettingsService};
use crate::config::Config;
use crate::domain::scan::entities::{
    AiStatus, Device, EngineStatus, JobState, LogEntry, LogLevel, NetworkInterface, Report,
    ReportSummary, ScanParams, ScanResults, Severity, Vulnerability,
};
use crate::domain::scan::engine::ScanEngine;
use crate::domain::scan::errors::EngineError;
use crate::presentation::controllers::AppState;
use crate::presentation::extractors::AUTH_PASSWORD_HEADER;
use crate::presentation::routes::create_router;

const PASSWORD: &str = "admin123";

struct MockEngine {
    running: AtomicBool,
    scan_id: Uuid,
    device: Device,
    report: Report,
    logs: Vec<LogEntry>,
}

impl MockEngine {
    fn new() -> Self {
        let scan_id = Uuid::new_v4();
        let device = Device {
            ip: "192.168.1.23".to_string(),
            mac: "aa:bb:cc:dd:ee:ff".to_string(),
            hostname: Some("cam-hallway".to_string()),
            vendor: None,
            device_type: Some("camera".to_string()),
            open_ports: Vec::new(),
            risk_level: Severity::High,
            vulnerabilities_count: 1,
            last_seen: Utc::now(),
        };
        let report = Report {
            id: Uuid::new_v4(),
            scan_id,
            timestamp: Utc::now(),
            results: ScanResults::empty(),
        };
        let log = |level, message: &str| LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            source: Some("engine".to_string()),
        };
        Self {
            running: AtomicBool::new(false),
            scan_id,
            device,
            report,
            logs: vec![
                log(LogLevel::Info, "Scan started"),
                log(LogLevel::Warning, "Telnet exposed on 192.168.1.23"),
                log(LogLevel::Info, "Scan finished"),
            ],
        }
    }
}

#[async_trait]
impl ScanEngine for MockEngine {
    async fn list_interfaces(&self) -> Result<Vec<NetworkInterface>, EngineError> {
        Ok(vec![NetworkInterface {
            name: "eth0".to_string(),
            ip: "192.168.1.5".to_string(),
            netmask: "255.255.255.0".to_string(),
            mac: Some("11:22:33:44:55:66".to_string()),
            is_up: true,
        }])
    }

    async fn start_scan(&self, _params: ScanParams) -> Result<Uuid, EngineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::Busy);
        }
        Ok(self.scan_id)
    }

    async fn scan_status(&self) -> EngineStatus {
        if self.running.load(Ordering::SeqCst) {
            EngineStatus {
                scan_id: Some(self.scan_id),
                state: JobState::Running,
                progress: 0.25,
                current_phase: "port scan".to_string(),
                devices_found: 1,
                started_at: Some(Utc::now()),
                finished_at: None,
                error: None,
            }
        } else {
            EngineStatus::idle()
        }
    }

    async fn scan_results(&self) -> ScanResults {
        ScanResults::empty()
    }

    async fn stop_scan(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn list_devices(&self) -> Result<Vec<Device>, EngineError> {
        Ok(vec![self.device.clone()])
    }

    async fn get_device(&self, ip: &str) -> Result<Option<Device>, EngineError> {
        Ok((ip == self.device.ip).then(|| self.device.clone()))
    }

    async fn list_vulnerabilities(&self) -> Result<Vec<Vulnerability>, EngineError> {
        Ok(Vec::new())
    }

    async fn list_reports(&self) -> Result<Vec<ReportSummary>, EngineError> {
        Ok(vec![self.report.summary()])
    }

    async fn get_report(&self, id: &str) -> Result<Option<Report>, EngineError> {
        Ok((id == self.report.id.to_string()).then(|| self.report.clone()))
    }

    async fn get_logs(&self, level: Option<LogLevel>) -> Vec<LogEntry> {
        match level {
            Some(level) => self
                .logs
                .iter()
                .filter(|e| e.level == level)
                .cloned()
                .collect(),
            None => self.logs.clone(),
        }
    }

    async fn ai_status(&self) -> AiStatus {
        AiStatus {
            enabled: true,
            model_loaded: false,
            model_version: None,
            devices_classified: 1,
            backend: "heuristic".to_string(),
        }
    }
}

fn test_router() -> (Router, Arc<MockEngine>) {
    let mut config = Config::default();
    config.server.enable_docs = false;
    let config = Arc::new(config);

    let engine = Arc::new(MockEngine::new());
    let credentials = Arc::new(CredentialStore::new(PASSWORD));
    let settings = Arc::new(SettingsService::new(Settings::default()));
    let jobs = Arc::new(JobController::new(engine.clone(), settings.clone()));

    let state = AppState {
        credentials,
        jobs,
        settings,
        engine: engine.clone(),
        config: config.clone(),
        startup_time: Instant::now(),
    };

    (create_router(state, &config), engine)
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(AUTH_PASSWORD_HEADER, PASSWORD)
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: Method, path: &str, body: Value, password: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(password) = password {
        builder = builder.header(AUTH_PASSWORD_HEADER, password);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn dispatch(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn auth_accepts_the_configured_password() {
    let (router, _) = test_router();
    let response = dispatch(
        &router,
        send_json(Method::POST, "/api/auth", json!({"password": PASSWORD}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"valid": true}));
}

#[tokio::test]
async fn auth_rejects_a_wrong_password() {
    let (router, _) = test_router();
    let response = dispatch(
        &router,
        send_json(Method::POST, "/api/auth", json!({"password": "nope"}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["valid"], json!(false));
}

#[tokio::test]
async fn protected_routes_require_the_password_header() {
    let (router, _) = test_router();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/devices")
        .body(Body::empty())
        .unwrap();
    let response = dispatch(&router, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn rejected_start_has_no_side_effect() {
    let (router, _) = test_router();

    let response = dispatch(
        &router,
        send_json(Method::POST, "/api/scan/start", json!({}), Some("wrong")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let status = body_json(dispatch(&router, get("/api/scan/status")).await).await;
    assert_eq!(status["state"], json!("idle"));
}

#[tokio::test]
async fn start_reports_running_and_a_second_start_fails() {
    let (router, _) = test_router();

    let response = dispatch(
        &router,
        send_json(Method::POST, "/api/scan/start", json!({}), Some(PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let started = body_json(response).await;
    assert!(started["scan_id"].is_string());

    let status = body_json(dispatch(&router, get("/api/scan/status")).await).await;
    assert_eq!(status["state"], json!("running"));
    assert_eq!(status["scan_id"], started["scan_id"]);

    let response = dispatch(
        &router,
        send_json(Method::POST, "/api/scan/start", json!({}), Some(PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "A scan is already running"})
    );
}

#[tokio::test]
async fn stop_is_idempotent_over_http() {
    let (router, _) = test_router();

    dispatch(
        &router,
        send_json(Method::POST, "/api/scan/start", json!({}), Some(PASSWORD)),
    )
    .await;

    for _ in 0..2 {
        let response = dispatch(
            &router,
            send_json(Method::POST, "/api/scan/stop", json!({}), Some(PASSWORD)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"stopped": true}));
    }
}

#[tokio::test]
async fn malformed_port_range_is_a_bad_request() {
    let (router, _) = test_router();
    let response = dispatch(
        &router,
        send_json(
            Method::POST,
            "/api/scan/start",
            json!({"port_range": "9000-1"}),
            Some(PASSWORD),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn known_device_is_served_and_unknown_is_404() {
    let (router, _) = test_router();

    let response = dispatch(&router, get("/api/devices/192.168.1.23")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ip"], json!("192.168.1.23"));

    let response = dispatch(&router, get("/api/devices/10.0.0.99")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Device not found"})
    );
}

#[tokio::test]
async fn report_download_is_an_attachment() {
    let (router, engine) = test_router();
    let id = engine.report.id;

    let response = dispatch(&router, get(&format!("/api/reports/{id}/download"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert_eq!(disposition, format!("attachment; filename=report-{id}.json"));

    let response = dispatch(&router, get(&format!("/api/reports/{}", Uuid::new_v4()))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn settings_update_round_trips() {
    let (router, _) = test_router();

    let response = dispatch(
        &router,
        send_json(
            Method::PUT,
            "/api/settings",
            json!({"max_threads": 20}),
            Some(PASSWORD),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    // the accepted mapping is echoed back as-is
    assert_eq!(body_json(response).await, json!({"max_threads": 20}));

    let settings = body_json(dispatch(&router, get("/api/settings")).await).await;
    assert_eq!(settings["max_threads"], json!(20));
}

#[tokio::test]
async fn unknown_settings_key_is_a_bad_request() {
    let (router, _) = test_router();
    let response = dispatch(
        &router,
        send_json(
            Method::PUT,
            "/api/settings",
            json!({"theme": "dark"}),
            Some(PASSWORD),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Unknown settings key"));
}

#[tokio::test]
async fn password_rotation_requires_the_current_password() {
    let (router, _) = test_router();

    let response = dispatch(
        &router,
        send_json(
            Method::POST,
            "/api/settings/password",
            json!({"old_password": "wrong", "new_password": "fresh"}),
            Some(PASSWORD),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Current password is incorrect"})
    );

    // the old password still authenticates after the failed rotation
    let response = dispatch(&router, get("/api/devices")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn password_rotation_takes_effect_immediately() {
    let (router, _) = test_router();

    let response = dispatch(
        &router,
        send_json(
            Method::POST,
            "/api/settings/password",
            json!({"old_password": PASSWORD, "new_password": "fresh"}),
            Some(PASSWORD),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"updated": true}));

    let response = dispatch(&router, get("/api/devices")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/devices")
        .header(AUTH_PASSWORD_HEADER, "fresh")
        .body(Body::empty())
        .unwrap();
    let response = dispatch(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logs_filter_by_level_and_reject_unknown_levels() {
    let (router, _) = test_router();

    let response = dispatch(&router, get("/api/logs?level=WARNING")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let entries = body_json(response).await;
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["level"], json!("WARNING"));

    let response = dispatch(&router, get("/api/logs?level=verbose")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn interfaces_and_ai_status_are_served() {
    let (router, _) = test_router();

    let response = dispatch(&router, get("/api/interfaces")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await[0]["name"], json!("eth0"));

    let response = dispatch(&router, get("/api/ai/status")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["backend"], json!("heuristic"));
}

#[tokio::test]
async fn swagger_ui_is_only_mounted_when_enabled() {
    let (router, _) = test_router();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/docs")
        .body(Body::empty())
        .unwrap();
    let response = dispatch(&router, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let mut config = Config::default();
    config.server.enable_docs = true;
    let config = Arc::new(config);
    let engine = Arc::new(MockEngine::new());
    let settings = Arc::new(SettingsService::new(Settings::default()));
    let state = AppState {
        credentials: Arc::new(CredentialStore::new(PASSWORD)),
        jobs: Arc::new(JobController::new(engine.clone(), settings.clone())),
        settings,
        engine,
        config: config.clone(),
        startup_time: Instant::now(),
    };
    let router = create_router(state, &config);
    let request = Request::builder()
        .method(Method::GET)
        .uri("/docs")
        .body(Body::empty())
        .unwrap();
    let response = dispatch(&router, request).await;
    assert_ne!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_is_reachable_without_a_password() {
    let (router, _) = test_router();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = dispatch(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("healthy"));
}
