//! Password-gate extractor
//!
//! Middleware injects [`AuthState`] into request extensions; protected
//! handlers take [`RequireAuth`] as an argument and get a 401 before the
//! handler body runs when the password header is absent or wrong.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::application::credentials::CredentialStore;
use crate::application::errors::ApplicationError;
use crate::domain::scan::errors::EngineError;
use crate::presentation::controllers::AppState;
use crate::presentation::models::ApiError;

/// Header carrying the shared password on every protected request
pub const AUTH_PASSWORD_HEADER: &str = "x-auth-password";

#[derive(Clone)]
pub struct AuthState {
    pub credentials: Arc<CredentialStore>,
}

/// Makes the credential store reachable from [`RequireAuth`] without every
/// handler threading it through.
pub async fn inject_auth_state(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(AuthState {
        credentials: state.credentials.clone(),
    });
    next.run(request).await
}

pub struct RequireAuth;

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthState>()
            .cloned()
            .ok_or_else(|| {
                ApiError(ApplicationError::Engine(EngineError::Failure(
                    "auth state missing from request".to_string(),
                )))
            })?;

        let candidate = parts
            .headers
            .get(AUTH_PASSWORD_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError(ApplicationError::Unauthorized))?;

        if auth.credentials.verify(candidate).await {
            Ok(RequireAuth)
        } else {
            Err(ApiError(ApplicationError::Unauthorized))
        }
    }
}
