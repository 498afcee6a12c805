//! Request-scoped error type and its HTTP mapping.
//!
//! Every error here ends the current request only. Authorization failures are
//! not errors: the gates answer them with redirects.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::records::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("host not allowed")]
    InvalidHost,
    #[error("missing or mismatched CSRF token")]
    InvalidCsrfToken,
    #[error("request body too large or unreadable")]
    PayloadTooLarge,
    #[error("not signed in")]
    Unauthenticated,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("not found")]
    NotFound,
    #[error("session missing from request context")]
    MissingSession,
    #[error("session store failed: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Stable machine-readable code placed in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidHost => "invalid_host",
            AppError::InvalidCsrfToken => "invalid_csrf_token",
            AppError::PayloadTooLarge => "payload_too_large",
            AppError::Unauthenticated => "unauthenticated",
            AppError::InvalidInput(code) => code,
            AppError::NotFound => "not_found",
            AppError::MissingSession | AppError::Session(_) => "internal_error",
            AppError::Store(e) => e.code(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidHost | AppError::InvalidCsrfToken | AppError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MissingSession | AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(StoreError::UnknownTenant(_)) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::DuplicateTenant(_)) => StatusCode::CONFLICT,
            AppError::Store(StoreError::TenantIdsExhausted) => StatusCode::INSUFFICIENT_STORAGE,
            AppError::Store(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.code() }))).into_response()
    }
}
