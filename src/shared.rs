use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::account::service::ProfileService;
use crate::session::password::PasswordHasher;
use crate::session::service::SessionService;
use crate::session::token::TokenConfig;
use crate::store::repository::CredentialStore;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
    pub profile_service: Arc<ProfileService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore + Send + Sync>,
        token_config: TokenConfig,
        hasher: PasswordHasher,
    ) -> Self {
        let session_service = Arc::new(SessionService::new(
            Arc::clone(&store),
            token_config,
            hasher.clone(),
        ));
        let profile_service = Arc::new(ProfileService::new(store, hasher));

        Self {
            session_service,
            profile_service,
        }
    }
}

/// Why a session check turned the caller away. Kept as a closed enum so tests
/// and the transport layer can match on the exact reason.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedReason {
    #[error("no token, please login")]
    MissingToken,

    #[error("token has been logged out, please login")]
    Revoked,

    #[error("invalid token, please login")]
    InvalidToken,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    Denied(DeniedReason),

    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid username or password".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Denied(reason) => (StatusCode::FORBIDDEN, format!("access denied: {reason}")),
            AppError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
