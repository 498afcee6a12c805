//! Tenant registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::auth::identity::TenantId;
use crate::config::TenantSeed;
use crate::records::{unix_now, StoreError};

/// An employer organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Suspended tenants cannot sign in.
    pub active: bool,
    pub created_at: u64,
}

/// Thread-safe tenant registry.
#[derive(Clone)]
pub struct TenantRegistry {
    inner: Arc<DashMap<TenantId, Tenant>>,
    /// Normalised name → id; the uniqueness check and the reservation are one step.
    names: Arc<DashMap<String, TenantId>>,
    next_id: Arc<AtomicU64>,
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Default for TenantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            names: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn from_seeds(seeds: impl IntoIterator<Item = TenantSeed>) -> Self {
        let registry = Self::new();
        let now = unix_now();
        for seed in seeds {
            registry.next_id.fetch_max(seed.id.0.saturating_add(1), Ordering::Relaxed);
            registry.names.insert(name_key(&seed.name), seed.id);
            registry.inner.insert(
                seed.id,
                Tenant {
                    id: seed.id,
                    name: seed.name,
                    active: seed.active,
                    created_at: now,
                },
            );
        }
        registry
    }

    /// Create a tenant. Names are unique, ignoring case and surrounding whitespace.
    pub fn create(&self, name: &str) -> Result<Tenant, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyTenantName);
        }
        // The entry holds its shard lock until the tenant is stored.
        let slot = match self.names.entry(name_key(name)) {
            Entry::Occupied(_) => return Err(StoreError::DuplicateTenant(name.to_string())),
            Entry::Vacant(slot) => slot,
        };

        let id = self.allocate_id()?;
        let tenant = Tenant {
            id,
            name: name.to_string(),
            active: true,
            created_at: unix_now(),
        };
        self.inner.insert(id, tenant.clone());
        slot.insert(id);
        tracing::info!(tenant_id = %id, name = %tenant.name, "Tenant created");
        Ok(tenant)
    }

    /// Next unused id. `u64::MAX` is never handed out.
    fn allocate_id(&self) -> Result<TenantId, StoreError> {
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| next.checked_add(1))
            .map(TenantId)
            .map_err(|_| StoreError::TenantIdsExhausted)
    }

    pub fn get(&self, id: TenantId) -> Option<Tenant> {
        self.inner.get(&id).map(|r| r.value().clone())
    }

    /// Unknown tenants count as inactive.
    pub fn is_active(&self, id: TenantId) -> bool {
        self.inner.get(&id).map(|r| r.value().active).unwrap_or(false)
    }

    pub fn suspend(&self, id: TenantId) -> Result<Tenant, StoreError> {
        let mut entry = self.inner.get_mut(&id).ok_or(StoreError::UnknownTenant(id))?;
        entry.active = false;
        tracing::warn!(tenant_id = %id, "Tenant suspended");
        Ok(entry.clone())
    }

    /// All tenants ordered by id.
    pub fn list(&self) -> Vec<Tenant> {
        let mut tenants: Vec<Tenant> = self.inner.iter().map(|r| r.value().clone()).collect();
        tenants.sort_by_key(|t| t.id);
        tenants
    }
}
