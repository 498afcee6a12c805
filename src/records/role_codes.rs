//! Role codes issued by tenant administrators.
//!
//! A role code is a short random string that grants a role within one tenant
//! when an employee registers with it.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;

use crate::auth::identity::{Role, TenantId, UserId};
use crate::records::{unix_now, StoreError};

/// Unambiguous characters only (no 0/O, 1/I).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCode {
    pub code: String,
    pub tenant_id: TenantId,
    pub role: Role,
    pub issued_by: UserId,
    pub issued_at: u64,
}

/// Thread-safe role code registry keyed by code.
#[derive(Clone, Default)]
pub struct RoleCodeRegistry {
    inner: Arc<DashMap<String, RoleCode>>,
}

impl RoleCodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh code. Platform admin cannot be granted through a code.
    pub fn issue(
        &self,
        tenant_id: TenantId,
        role: Role,
        issued_by: UserId,
    ) -> Result<RoleCode, StoreError> {
        if role.is_platform_admin() {
            return Err(StoreError::RoleNotIssuable(role));
        }

        loop {
            let Entry::Vacant(slot) = self.inner.entry(generate_code()) else {
                continue;
            };
            let issued = RoleCode {
                code: slot.key().clone(),
                tenant_id,
                role,
                issued_by,
                issued_at: unix_now(),
            };
            slot.insert(issued.clone());
            tracing::info!(tenant_id = %tenant_id, role = %role, issued_by = %issued_by, "Role code issued");
            return Ok(issued);
        }
    }

    #[cfg(test)]
    pub fn get(&self, code: &str) -> Option<RoleCode> {
        self.inner.get(code.trim()).map(|r| r.value().clone())
    }

    /// Codes belonging to one tenant, newest first.
    pub fn list_for_tenant(&self, tenant_id: TenantId) -> Vec<RoleCode> {
        let mut codes: Vec<RoleCode> = self
            .inner
            .iter()
            .filter(|r| r.value().tenant_id == tenant_id)
            .map(|r| r.value().clone())
            .collect();
        codes.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then_with(|| a.code.cmp(&b.code)));
        codes
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
