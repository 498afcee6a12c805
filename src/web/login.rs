//! Sign-in and sign-out.
//!
//! # State Machine
//! ```text
//! anonymous ── POST /login (valid) ──▶ authenticated   [id rotated, token rotated]
//! anonymous ── POST /login (valid, TOTP account)
//!                                  ──▶ pending second factor [id rotated, 303 /login/mfa]
//! anonymous ── POST /login (bad)   ──▶ anonymous       [flash, 303 /login]
//! any       ── POST /logout        ──▶ anonymous       [session destroyed]
//! ```
//!
//! # Design Decisions
//! - One message for every failure so accounts cannot be enumerated
//! - Unknown emails still pay for one argon2 verification
//! - Argon2 runs on the blocking pool

use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::auth::identity::CurrentUser;
use crate::auth::password::{verify_against_dummy, verify_password};
use crate::auth::users::UserRecord;
use crate::http::error::AppError;
use crate::http::response::{csrf_input, escape, flash_list, page};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::records::unix_now;
use crate::routing::gates::{DASHBOARD_PATH, LOGIN_PATH, MFA_PATH};
use crate::security::csrf;
use crate::session::{Flash, PendingMfa, Session};

pub(crate) const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn form(session: Session, CurrentUser(user): CurrentUser) -> Response {
    if user.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let token = csrf::get_token(&session);
    let flashes = session.take_flashes();
    let body = format!(
        "<h1>Sign in</h1>\n{flashes}\n\
         <form method=\"post\" action=\"{action}\">\n{csrf}\n\
         <label>Email <input type=\"email\" name=\"email\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button type=\"submit\">Sign in</button>\n</form>",
        flashes = flash_list(&flashes),
        action = escape(LOGIN_PATH),
        csrf = csrf_input(&token),
    );
    page("Sign in", &body).into_response()
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(form) = form.map_err(|_| AppError::InvalidInput("invalid_form"))?;

    let account = match state.users.find_by_email(&form.email) {
        Some(record) => check_password(record, form.password).await,
        None => {
            burn_password_check(form.password).await;
            None
        }
    };

    match account {
        Some(record) if state.resolver.is_usable(&record) && record.totp_secret.is_some() => {
            session.regenerate();
            session.set_pending_mfa(PendingMfa {
                user_id: record.id,
                issued_at: unix_now(),
                failed_attempts: 0,
            });
            metrics::record_login("mfa_required");
            tracing::info!(user_id = %record.id, "Password accepted, second factor required");
            Ok(Redirect::to(MFA_PATH))
        }
        Some(record) if state.resolver.is_usable(&record) => {
            session.regenerate();
            session.set_user_id(record.id);
            metrics::record_login("success");
            tracing::info!(user_id = %record.id, role = %record.role, "User signed in");
            Ok(Redirect::to(DASHBOARD_PATH))
        }
        Some(record) => {
            metrics::record_login("disabled");
            tracing::warn!(user_id = %record.id, "Sign-in refused for disabled account");
            session.push_flash(Flash::error(INVALID_CREDENTIALS));
            Ok(Redirect::to(LOGIN_PATH))
        }
        None => {
            metrics::record_login("invalid_credentials");
            tracing::info!("Sign-in failed");
            session.push_flash(Flash::error(INVALID_CREDENTIALS));
            Ok(Redirect::to(LOGIN_PATH))
        }
    }
}

async fn check_password(record: UserRecord, password: String) -> Option<UserRecord> {
    let hash = record.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            false
        });
    verified.then_some(record)
}

async fn burn_password_check(password: String) {
    if let Err(e) = tokio::task::spawn_blocking(move || verify_against_dummy(&password)).await {
        tracing::error!(error = %e, "Password verification task failed");
    }
}

pub async fn logout(session: Session, CurrentUser(user): CurrentUser) -> Redirect {
    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "User signed out");
    }
    session.destroy();
    Redirect::to(LOGIN_PATH)
}
