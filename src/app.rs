//! Application assembly
//!
//! Wires the engine, credential store, settings facade and job controller
//! into the router, and owns the shutdown token that tears the scan down
//! when the process exits.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::application::credentials::CredentialStore;
use crate::application::jobs::JobController;
use crate::application::settings::{Settings, SettingsService};
use crate::config::Config;
use crate::domain::scan::engine::ScanEngine;
use crate::infrastructure::LocalScanEngine;
use crate::presentation::controllers::AppState;
use crate::presentation::routes::create_router;

pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Build the service. Must run inside a Tokio runtime; cancelling the
/// returned token stops any scan in flight.
pub fn create_app(config: Config) -> AppHandle {
    let config = Arc::new(config);
    let engine: Arc<dyn ScanEngine> = Arc::new(LocalScanEngine::new(&config.scanner));
    let credentials = Arc::new(CredentialStore::new(config.auth.password.clone()));
    let settings = Arc::new(SettingsService::new(Settings::from(&config.scanner)));
    let jobs = Arc::new(JobController::new(engine.clone(), settings.clone()));

    let state = AppState {
        credentials,
        jobs,
        settings,
        engine: engine.clone(),
        config: config.clone(),
        startup_time: Instant::now(),
    };

    let router = create_router(state, &config);

    let shutdown_token = CancellationToken::new();
    let token = shutdown_token.clone();
    tokio::spawn(async move {
        token.cancelled().await;
        engine.stop_scan().await;
    });

    AppHandle {
        router,
        shutdown_token,
    }
}
