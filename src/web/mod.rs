//! Employee-facing pages and health checks.
//!
//! Access control is not decided here: the policy table in `routing` gates
//! every path before these handlers run.

pub mod dashboard;
pub mod login;
pub mod mfa;
pub mod punches;
pub mod system;

use axum::{
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;

pub fn setup_portal_router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::root))
        .route("/health", get(system::health))
        .route("/whoami", get(system::whoami))
        .route("/login", get(login::form).post(login::submit))
        .route("/login/mfa", get(mfa::form).post(mfa::submit))
        .route("/logout", post(login::logout))
        .route("/dashboard", get(dashboard::show))
        .route("/punches", get(punches::list).post(punches::record))
}
