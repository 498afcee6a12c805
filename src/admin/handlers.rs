use axum::{
    extract::{rejection::FormRejection, State},
    response::Redirect,
    Form, Json,
};
use serde::Deserialize;

use crate::auth::identity::{Role, TenantId, UserIdentity};
use crate::http::error::AppError;
use crate::http::server::AppState;
use crate::records::RoleCode;

pub const ROLE_CODES_PATH: &str = "/admin/role-codes";

#[derive(Debug, Deserialize)]
pub struct IssueRoleCodeForm {
    pub role: String,
}

/// Tenant administration acts on the admin's own tenant only.
fn admin_tenant(user: &UserIdentity) -> Result<TenantId, AppError> {
    user.tenant_id.ok_or(AppError::InvalidInput("tenant_required"))
}

pub async fn list_role_codes(
    State(state): State<AppState>,
    user: UserIdentity,
) -> Result<Json<Vec<RoleCode>>, AppError> {
    let tenant = admin_tenant(&user)?;
    Ok(Json(state.role_codes.list_for_tenant(tenant)))
}

pub async fn issue_role_code(
    State(state): State<AppState>,
    user: UserIdentity,
    form: Result<Form<IssueRoleCodeForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(form) = form.map_err(|_| AppError::InvalidInput("invalid_form"))?;
    let tenant = admin_tenant(&user)?;
    let role = Role::from_code(form.role.trim()).ok_or(AppError::InvalidInput("invalid_role"))?;

    state.role_codes.issue(tenant, role, user.id)?;
    Ok(Redirect::to(ROLE_CODES_PATH))
}
