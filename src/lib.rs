//! netwarden: password-gated HTTP control plane for a local IoT security
//! scanner.
//!
//! One background scan runs at a time. The API starts and stops it, reports
//! its progress, and serves the devices, vulnerability findings, reports and
//! logs it produces. Every endpoint except the password check and the health
//! probe requires the shared password header.

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use app::{create_app, AppHandle};
pub use config::Config;
pub use logging::init_tracing;
