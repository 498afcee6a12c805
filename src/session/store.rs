//! Session payload and the server-side store behind tower-sessions.
//!
//! # Responsibilities
//! - Define the typed session payload (user id, pending second factor, CSRF
//!   token, flashes, creation and last-seen instants)
//! - Persist tower-sessions records keyed by their opaque id
//! - Treat records past their expiry as absent
//!
//! # Design Decisions
//! - tower-sessions' `SessionStore` trait is the seam to an external store
//! - No optimistic concurrency: last write wins
//! - Expiry is checked on load and swept periodically

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};

use crate::auth::identity::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Error, message: message.into() }
    }
}

/// Password accepted, second factor outstanding.
///
/// While present the session is anonymous: `user_id` stays unset until the
/// code is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMfa {
    pub user_id: UserId,
    pub issued_at: u64,
    pub failed_attempts: u8,
}

/// Typed session payload, stored under a single key of the tower-sessions record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    pub user_id: Option<UserId>,
    pub pending_mfa: Option<PendingMfa>,
    pub csrf_token: Option<String>,
    pub flashes: Vec<Flash>,
    /// Seconds since the Unix epoch; zero until first stored.
    pub created_at: u64,
    pub last_seen_at: u64,
}

/// Concurrent in-memory session store.
///
/// Cloning yields another handle to the same records.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<DashMap<Id, Record>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored records, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record expired at `now`; returns how many were dropped.
    pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| is_live(record, now));
        before.saturating_sub(self.records.len())
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.records.clear();
    }
}

fn is_live(record: &Record, now: OffsetDateTime) -> bool {
    record.expiry_date > now
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            match self.records.entry(record.id) {
                Entry::Occupied(_) => record.id = Id::default(),
                Entry::Vacant(slot) => {
                    slot.insert(record.clone());
                    return Ok(());
                }
            }
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let Some(record) = self.records.get(id).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        if is_live(&record, OffsetDateTime::now_utc()) {
            Ok(Some(record))
        } else {
            self.records.remove(id);
            Ok(None)
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.records.remove(id);
        Ok(())
    }
}
