//! Authorization gates.
//!
//! # State Machine
//! ```text
//! anonymous     ── Auth gate ──▶ 303 /login
//! authenticated ── Auth gate ──▶ pass
//! ```
//! Re-evaluated for every request from the resolver's output; nothing is
//! remembered in-process.
//!
//! # Redirect Targets
//! - Tenant admin gate: non-admin → `/dashboard`
//! - Platform admin gate: anything but a platform admin → `/login`
//!
//! Gates never answer 403; under-privileged access is a silent redirect.

use crate::auth::identity::UserIdentity;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const MFA_PATH: &str = "/login/mfa";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Requires any signed-in user.
    Auth,
    /// Requires tenant administration (tenant admin or platform admin).
    TenantAdmin,
    /// Requires the platform admin role.
    PlatformAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    /// 303 See Other to the given path.
    Redirect(&'static str),
}

impl Gate {
    pub fn name(self) -> &'static str {
        match self {
            Gate::Auth => "auth",
            Gate::TenantAdmin => "tenant_admin",
            Gate::PlatformAdmin => "platform_admin",
        }
    }

    pub fn evaluate(self, user: Option<&UserIdentity>) -> GateDecision {
        match (self, user) {
            (_, None) => GateDecision::Redirect(LOGIN_PATH),
            (Gate::Auth, Some(_)) => GateDecision::Pass,
            (Gate::TenantAdmin, Some(u)) if u.role.is_admin() => GateDecision::Pass,
            (Gate::TenantAdmin, Some(_)) => GateDecision::Redirect(DASHBOARD_PATH),
            (Gate::PlatformAdmin, Some(u)) if u.role.is_platform_admin() => GateDecision::Pass,
            (Gate::PlatformAdmin, Some(_)) => GateDecision::Redirect(LOGIN_PATH),
        }
    }
}
