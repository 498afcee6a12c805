//! Current-user resolution.
//!
//! Reads the session's user id, loads the account and inserts exactly one
//! `CurrentUser` into the request extensions. Never fails the request: any
//! lookup miss resolves to the anonymous state, and so does a session still
//! waiting for its second factor.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::identity::{CurrentUser, UserId, UserIdentity};
use crate::auth::users::{UserDirectory, UserRecord};
use crate::records::tenants::TenantRegistry;
use crate::session::Session;

/// Account lookups needed to resolve the signed-in user.
#[derive(Clone)]
pub struct UserResolver {
    users: Arc<dyn UserDirectory>,
    tenants: TenantRegistry,
}

impl UserResolver {
    pub fn new(users: Arc<dyn UserDirectory>, tenants: TenantRegistry) -> Self {
        Self { users, tenants }
    }

    /// Identity for `user_id`, or `None` if the account is gone, disabled,
    /// or its tenant is suspended.
    pub fn resolve(&self, user_id: UserId) -> Option<UserIdentity> {
        let record = self.users.find_by_id(user_id)?;
        self.is_usable(&record).then(|| record.identity())
    }

    /// Identity behind a session. Sessions with a pending second factor are anonymous.
    pub fn resolve_session(&self, session: &Session) -> Option<UserIdentity> {
        if session.pending_mfa().is_some() {
            return None;
        }
        let user_id = session.user_id()?;
        let resolved = self.resolve(user_id);
        if resolved.is_none() {
            tracing::debug!(%user_id, "Session user no longer resolves");
        }
        resolved
    }

    /// Whether the account may hold a session right now.
    pub fn is_usable(&self, record: &UserRecord) -> bool {
        if !record.active {
            return false;
        }
        match record.tenant_id {
            Some(tenant) => self.tenants.is_active(tenant),
            None => record.role.is_platform_admin(),
        }
    }
}

/// Middleware inserting `CurrentUser` for the rest of the chain.
///
/// Must run inside the session middleware.
pub async fn resolve_current_user(
    State(resolver): State<UserResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = request
        .extensions()
        .get::<Session>()
        .and_then(|session| resolver.resolve_session(session));

    request.extensions_mut().insert(CurrentUser(identity));
    next.run(request).await
}
