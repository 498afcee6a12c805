//! Second sign-in step for accounts with a TOTP secret.
//!
//! # State Machine
//! ```text
//! pending ── POST /login/mfa (valid)        ──▶ authenticated  [id rotated, token rotated]
//! pending ── POST /login/mfa (bad)          ──▶ pending        [attempt counted, 303 /login/mfa]
//! pending ── 5th bad code, or window passed ──▶ anonymous      [flash, 303 /login]
//! ```

use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::auth::identity::CurrentUser;
use crate::auth::totp;
use crate::http::error::AppError;
use crate::http::response::{csrf_input, escape, flash_list, page};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::records::unix_now;
use crate::routing::gates::{DASHBOARD_PATH, LOGIN_PATH, MFA_PATH};
use crate::security::csrf;
use crate::session::{Flash, PendingMfa, Session};
use crate::web::login::INVALID_CREDENTIALS;

/// Seconds between the password step and the code.
pub const MFA_WINDOW_SECS: u64 = 300;
pub const MAX_MFA_ATTEMPTS: u8 = 5;

const INVALID_CODE: &str = "Invalid verification code.";
const MFA_EXPIRED: &str = "Verification expired. Sign in again.";

#[derive(Debug, Deserialize)]
pub struct MfaForm {
    pub code: String,
}

fn is_expired(pending: &PendingMfa, now: u64) -> bool {
    now.saturating_sub(pending.issued_at) > MFA_WINDOW_SECS
}

pub async fn form(session: Session, CurrentUser(user): CurrentUser) -> Response {
    if user.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    match session.pending_mfa() {
        Some(pending) if !is_expired(&pending, unix_now()) => {}
        Some(_) => {
            session.clear_pending_mfa();
            session.push_flash(Flash::error(MFA_EXPIRED));
            return Redirect::to(LOGIN_PATH).into_response();
        }
        None => return Redirect::to(LOGIN_PATH).into_response(),
    }

    let token = csrf::get_token(&session);
    let flashes = session.take_flashes();
    let body = format!(
        "<h1>Verification code</h1>\n{flashes}\n\
         <form method=\"post\" action=\"{action}\">\n{csrf}\n\
         <label>Code <input name=\"code\" inputmode=\"numeric\" autocomplete=\"one-time-code\" \
         pattern=\"[0-9]{{6}}\" required></label>\n\
         <button type=\"submit\">Verify</button>\n</form>",
        flashes = flash_list(&flashes),
        action = escape(MFA_PATH),
        csrf = csrf_input(&token),
    );
    page("Verification code", &body).into_response()
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<MfaForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(form) = form.map_err(|_| AppError::InvalidInput("invalid_form"))?;

    let Some(pending) = session.pending_mfa() else {
        return Ok(Redirect::to(LOGIN_PATH));
    };

    let now = unix_now();
    if is_expired(&pending, now) {
        metrics::record_login("mfa_expired");
        session.clear_pending_mfa();
        session.push_flash(Flash::error(MFA_EXPIRED));
        return Ok(Redirect::to(LOGIN_PATH));
    }

    // The account may have been disabled or lost its secret since the password step.
    let record = state
        .users
        .find_by_id(pending.user_id)
        .filter(|record| state.resolver.is_usable(record));
    let secret = record
        .as_ref()
        .and_then(|record| record.totp_secret.as_deref())
        .and_then(|encoded| totp::decode_secret(encoded).ok());
    let (Some(record), Some(secret)) = (record, secret) else {
        metrics::record_login("disabled");
        tracing::warn!(user_id = %pending.user_id, "Second factor refused for unusable account");
        session.clear_pending_mfa();
        session.push_flash(Flash::error(INVALID_CREDENTIALS));
        return Ok(Redirect::to(LOGIN_PATH));
    };

    if totp::verify(&secret, &form.code, now) {
        session.regenerate();
        session.set_user_id(record.id);
        metrics::record_login("success");
        tracing::info!(user_id = %record.id, role = %record.role, "User signed in with second factor");
        return Ok(Redirect::to(DASHBOARD_PATH));
    }

    metrics::record_login("invalid_code");
    let failed_attempts = pending.failed_attempts.saturating_add(1);
    if failed_attempts >= MAX_MFA_ATTEMPTS {
        tracing::warn!(user_id = %record.id, failed_attempts, "Too many invalid codes");
        session.clear_pending_mfa();
        session.push_flash(Flash::error(INVALID_CREDENTIALS));
        return Ok(Redirect::to(LOGIN_PATH));
    }

    tracing::info!(user_id = %record.id, failed_attempts, "Invalid verification code");
    session.set_pending_mfa(PendingMfa { failed_attempts, ..pending });
    session.push_flash(Flash::error(INVALID_CODE));
    Ok(Redirect::to(MFA_PATH))
}
