//! Platform administration (tenants).
//!
//! Only platform admins pass the `/platform` policy; any other caller is
//! sent to the login page.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_platform_router() -> Router<AppState> {
    Router::new()
        .route(TENANTS_PATH, get(list_tenants).post(create_tenant))
        .route("/platform/tenants/{id}/suspend", post(suspend_tenant))
}
