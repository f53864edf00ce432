//! Application-level error taxonomy
//!
//! Every component operation returns one of these typed outcomes; only the
//! presentation layer translates them into transport status codes.

use thiserror::Error;

use crate::domain::scan::errors::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{what} not found")]
    NotFound { what: &'static str },

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ApplicationError {
    pub fn not_found(what: &'static str) -> Self {
        ApplicationError::NotFound { what }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApplicationError::BadRequest(message.into())
    }
}
