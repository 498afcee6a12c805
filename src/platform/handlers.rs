use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        Path, State,
    },
    response::Redirect,
    Form, Json,
};
use serde::Deserialize;

use crate::auth::identity::{TenantId, UserIdentity};
use crate::http::error::AppError;
use crate::http::server::AppState;
use crate::records::Tenant;

pub const TENANTS_PATH: &str = "/platform/tenants";

#[derive(Debug, Deserialize)]
pub struct CreateTenantForm {
    pub name: String,
}

pub async fn list_tenants(State(state): State<AppState>) -> Json<Vec<Tenant>> {
    Json(state.tenants.list())
}

pub async fn create_tenant(
    State(state): State<AppState>,
    user: UserIdentity,
    form: Result<Form<CreateTenantForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(form) = form.map_err(|_| AppError::InvalidInput("invalid_form"))?;
    let tenant = state.tenants.create(&form.name)?;
    tracing::info!(tenant_id = %tenant.id, created_by = %user.id, "Tenant created");
    Ok(Redirect::to(TENANTS_PATH))
}

pub async fn suspend_tenant(
    State(state): State<AppState>,
    user: UserIdentity,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Redirect, AppError> {
    let Path(id) = id.map_err(|_| AppError::NotFound)?;
    let tenant = state.tenants.suspend(TenantId(id))?;
    tracing::warn!(tenant_id = %tenant.id, suspended_by = %user.id, "Tenant suspended");
    Ok(Redirect::to(TENANTS_PATH))
}
