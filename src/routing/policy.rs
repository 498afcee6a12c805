//! Declarative route policy table and the gate middleware.
//!
//! # Responsibilities
//! - Map every request path to exactly one access policy
//! - Run the policy's gates in order against the resolved user
//! - Redirect on the first failing gate, otherwise pass through
//!
//! # Design Decisions
//! - Most specific matching rule wins; ties go to the earlier rule
//! - Paths with no rule fall back to `Authenticated` (fail closed)
//! - Built once at startup and shared immutably

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::identity::CurrentUser;
use crate::observability::metrics;
use crate::routing::gates::{Gate, GateDecision};
use crate::routing::matcher::{ExactMatcher, Matcher, PrefixMatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Public,
    Authenticated,
    TenantAdmin,
    PlatformAdmin,
}

impl Policy {
    /// Gates evaluated for this policy, in order.
    pub fn gates(self) -> &'static [Gate] {
        match self {
            Policy::Public => &[],
            Policy::Authenticated => &[Gate::Auth],
            Policy::TenantAdmin => &[Gate::Auth, Gate::TenantAdmin],
            Policy::PlatformAdmin => &[Gate::Auth, Gate::PlatformAdmin],
        }
    }
}

#[derive(Debug)]
struct PolicyRule {
    matcher: Box<dyn Matcher>,
    policy: Policy,
}

/// Ordered set of path rules plus a fallback policy.
#[derive(Debug)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
    fallback: Policy,
}

impl PolicyTable {
    pub fn new(fallback: Policy) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    pub fn exact(mut self, path: &str, policy: Policy) -> Self {
        self.rules.push(PolicyRule {
            matcher: Box::new(ExactMatcher::new(path)),
            policy,
        });
        self
    }

    pub fn prefix(mut self, prefix: &str, policy: Policy) -> Self {
        self.rules.push(PolicyRule {
            matcher: Box::new(PrefixMatcher::new(prefix)),
            policy,
        });
        self
    }

    /// The portal's route policies.
    pub fn standard() -> Self {
        Self::new(Policy::Authenticated)
            .exact("/health", Policy::Public)
            .exact("/whoami", Policy::Public)
            .exact("/login", Policy::Public)
            .exact("/login/mfa", Policy::Public)
            .exact("/", Policy::Authenticated)
            .exact("/logout", Policy::Authenticated)
            .exact("/dashboard", Policy::Authenticated)
            .prefix("/punches", Policy::Authenticated)
            .prefix("/admin", Policy::TenantAdmin)
            .prefix("/platform", Policy::PlatformAdmin)
    }

    pub fn policy_for(&self, path: &str) -> Policy {
        let mut best: Option<(usize, Policy)> = None;
        for rule in &self.rules {
            if !rule.matcher.matches(path) {
                continue;
            }
            let rank = rule.matcher.specificity();
            if best.map_or(true, |(current, _)| rank > current) {
                best = Some((rank, rule.policy));
            }
        }
        best.map(|(_, policy)| policy).unwrap_or(self.fallback)
    }
}

/// Middleware applying the policy table.
///
/// Must run inside the current-user resolver.
pub async fn gate_middleware(
    State(table): State<Arc<PolicyTable>>,
    request: Request,
    next: Next,
) -> Response {
    let policy = table.policy_for(request.uri().path());

    let denied = {
        let user = request
            .extensions()
            .get::<CurrentUser>()
            .and_then(CurrentUser::get);
        policy.gates().iter().find_map(|gate| match gate.evaluate(user) {
            GateDecision::Pass => None,
            GateDecision::Redirect(target) => Some((*gate, target)),
        })
    };

    match denied {
        None => next.run(request).await,
        Some((gate, target)) => {
            tracing::debug!(
                path = %request.uri().path(),
                gate = gate.name(),
                target,
                "Gate redirected request"
            );
            metrics::record_gate_redirect(gate.name());
            Redirect::to(target).into_response()
        }
    }
}
