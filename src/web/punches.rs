//! Attendance punches for the signed-in user.

use axum::{extract::State, response::Redirect, Json};

use crate::auth::identity::UserIdentity;
use crate::http::server::AppState;
use crate::records::{Punch, PunchKind};
use crate::routing::gates::DASHBOARD_PATH;
use crate::session::{Flash, Session};

pub async fn list(State(state): State<AppState>, user: UserIdentity) -> Json<Vec<Punch>> {
    Json(state.punches.history(user.id))
}

pub async fn record(
    State(state): State<AppState>,
    session: Session,
    user: UserIdentity,
) -> Redirect {
    let punch = state.punches.punch(user.id, user.tenant_id);
    tracing::info!(user_id = %user.id, kind = ?punch.kind, "Punch recorded");

    let message = match punch.kind {
        PunchKind::ClockIn => "Clocked in.",
        PunchKind::ClockOut => "Clocked out.",
    };
    session.push_flash(Flash::info(message));
    Redirect::to(DASHBOARD_PATH)
}
