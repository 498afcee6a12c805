//! User directory.
//!
//! # Responsibilities
//! - Look accounts up by id (per-request resolution) and by email (login)
//! - Hold password hashes; never expose them through `UserIdentity`
//!
//! # Design Decisions
//! - `UserDirectory` is the seam to the persistence layer
//! - The in-memory directory is seeded from configuration

use dashmap::DashMap;

use crate::auth::identity::{Role, TenantId, UserId, UserIdentity};
use crate::config::UserSeed;

/// A stored account.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
    pub password_hash: String,
    pub totp_secret: Option<String>,
    pub active: bool,
}

impl UserRecord {
    /// Project the record into the identity handed to handlers.
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            tenant_id: self.tenant_id,
        }
    }
}

impl From<UserSeed> for UserRecord {
    fn from(seed: UserSeed) -> Self {
        Self {
            id: seed.id,
            email: seed.email,
            name: seed.name,
            role: seed.role,
            tenant_id: seed.tenant_id,
            password_hash: seed.password_hash,
            totp_secret: seed.totp_secret,
            active: seed.active,
        }
    }
}

/// Read access to stored accounts.
pub trait UserDirectory: Send + Sync {
    fn find_by_id(&self, id: UserId) -> Option<UserRecord>;

    /// Email lookup is case-insensitive.
    fn find_by_email(&self, email: &str) -> Option<UserRecord>;
}

/// Concurrent in-memory directory.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: DashMap<UserId, UserRecord>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds(seeds: impl IntoIterator<Item = UserSeed>) -> Self {
        let directory = Self::new();
        for seed in seeds {
            directory.insert(seed.into());
        }
        directory
    }

    pub fn insert(&self, record: UserRecord) {
        self.users.insert(record.id, record);
    }

    /// Enable or disable an account. Returns false if the account is unknown.
    pub fn set_active(&self, id: UserId, active: bool) -> bool {
        match self.users.get_mut(&id) {
            Some(mut record) => {
                record.active = active;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn find_by_id(&self, id: UserId) -> Option<UserRecord> {
        self.users.get(&id).map(|r| r.value().clone())
    }

    fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let email = email.trim();
        self.users
            .iter()
            .find(|r| r.value().email.eq_ignore_ascii_case(email))
            .map(|r| r.value().clone())
    }
}
