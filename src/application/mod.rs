//! Application services: credential store, job controller, settings facade

pub mod credentials;
pub mod errors;
pub mod jobs;
pub mod settings;

pub use credentials::{CredentialError, CredentialStore};
pub use errors::ApplicationError;
pub use jobs::{JobController, JobStatus, StartScan};
pub use settings::{Settings, SettingsService};
