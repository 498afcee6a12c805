//! Signed-in landing page.

use axum::{extract::State, response::Html, response::Redirect};

use crate::auth::identity::{Role, UserIdentity};
use crate::http::response::{escape, flash_list, page, post_button};
use crate::http::server::AppState;
use crate::routing::gates::DASHBOARD_PATH;
use crate::security::csrf;
use crate::session::Session;

pub async fn root() -> Redirect {
    Redirect::to(DASHBOARD_PATH)
}

pub async fn show(
    State(state): State<AppState>,
    session: Session,
    user: UserIdentity,
) -> Html<String> {
    let token = csrf::get_token(&session);
    let flashes = session.take_flashes();

    let tenant = user
        .tenant_id
        .and_then(|id| state.tenants.get(id))
        .map(|t| t.name)
        .unwrap_or_else(|| "All tenants".to_string());

    let (status, action) = if state.punches.is_clocked_in(user.id) {
        ("Clocked in", "Clock out")
    } else {
        ("Clocked out", "Clock in")
    };

    let mut links = String::new();
    if user.role.is_admin() {
        links.push_str("<li><a href=\"/admin/role-codes\">Role codes</a></li>");
    }
    if user.role == Role::PlatformAdmin {
        links.push_str("<li><a href=\"/platform/tenants\">Tenants</a></li>");
    }

    let body = format!(
        "<h1>Hello, {name}</h1>\n{flashes}\n\
         <p>{role} at {tenant}</p>\n<p>Status: {status}</p>\n{punch}\n\
         <ul>{links}</ul>\n{logout}",
        name = escape(&user.name),
        flashes = flash_list(&flashes),
        role = escape(user.role.code()),
        tenant = escape(&tenant),
        punch = post_button("/punches", &token, action),
        logout = post_button("/logout", &token, "Sign out"),
    );
    page("Dashboard", &body)
}
