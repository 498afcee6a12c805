//! Tenant administration (role codes).
//!
//! Reachable by tenant admins and platform admins; the `/admin` policy
//! redirects everyone else to the dashboard.

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router() -> Router<AppState> {
    Router::new().route(ROLE_CODES_PATH, get(list_role_codes).post(issue_role_code))
}
