//! In-memory record stores for the product surface.
//!
//! # Data Flow
//! ```text
//! Handlers
//!     → tenants.rs (platform administration)
//!     → role_codes.rs (tenant administration)
//!     → punches.rs (employee attendance)
//! ```
//!
//! # Design Decisions
//! - Each store is a cheap-to-clone handle around `Arc<DashMap<..>>`
//! - Timestamps are seconds since the Unix epoch

pub mod punches;
pub mod role_codes;
pub mod tenants;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::identity::{Role, TenantId};

pub use punches::{Punch, PunchKind, PunchLedger};
pub use role_codes::{RoleCode, RoleCodeRegistry};
pub use tenants::{Tenant, TenantRegistry};

/// Errors raised by the record stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("tenant {0} not found")]
    UnknownTenant(TenantId),
    #[error("tenant name {0:?} already exists")]
    DuplicateTenant(String),
    #[error("tenant name must not be empty")]
    EmptyTenantName,
    #[error("no tenant ids left to allocate")]
    TenantIdsExhausted,
    #[error("role {0} cannot be issued by role code")]
    RoleNotIssuable(Role),
}

impl StoreError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::UnknownTenant(_) => "unknown_tenant",
            StoreError::DuplicateTenant(_) => "duplicate_tenant",
            StoreError::EmptyTenantName => "invalid_tenant_name",
            StoreError::TenantIdsExhausted => "tenant_ids_exhausted",
            StoreError::RoleNotIssuable(_) => "invalid_role",
        }
    }
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
