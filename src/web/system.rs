//! Liveness and identity checks.

use axum::Json;

use crate::auth::identity::{CurrentUser, UserIdentity};
use crate::http::error::AppError;

/// Public liveness check. Touches no session.
pub async fn health() -> &'static str {
    "ok"
}

/// The signed-in user's identity, or 401 for anonymous callers.
pub async fn whoami(CurrentUser(user): CurrentUser) -> Result<Json<UserIdentity>, AppError> {
    user.map(Json).ok_or(AppError::Unauthenticated)
}
