//! Work-session punch ledger.
//!
//! Punches alternate: the first punch of a user is a clock-in, the next a
//! clock-out, and so on.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::auth::identity::{TenantId, UserId};
use crate::records::unix_now;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchKind {
    ClockIn,
    ClockOut,
}

impl PunchKind {
    fn next(self) -> Self {
        match self {
            PunchKind::ClockIn => PunchKind::ClockOut,
            PunchKind::ClockOut => PunchKind::ClockIn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Punch {
    pub kind: PunchKind,
    pub tenant_id: Option<TenantId>,
    pub at: u64,
}

/// Per-user punch history.
#[derive(Clone, Default)]
pub struct PunchLedger {
    inner: Arc<DashMap<UserId, Vec<Punch>>>,
}

impl PunchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next punch for a user and return it.
    pub fn punch(&self, user: UserId, tenant_id: Option<TenantId>) -> Punch {
        self.punch_at(user, tenant_id, unix_now())
    }

    fn punch_at(&self, user: UserId, tenant_id: Option<TenantId>, at: u64) -> Punch {
        let mut history = self.inner.entry(user).or_default();
        let kind = history
            .last()
            .map(|p| p.kind.next())
            .unwrap_or(PunchKind::ClockIn);
        let punch = Punch { kind, tenant_id, at };
        history.push(punch.clone());
        punch
    }

    pub fn history(&self, user: UserId) -> Vec<Punch> {
        self.inner.get(&user).map(|r| r.value().clone()).unwrap_or_default()
    }

    /// Whether the user's last punch was a clock-in.
    pub fn is_clocked_in(&self, user: UserId) -> bool {
        self.inner
            .get(&user)
            .and_then(|r| r.value().last().map(|p| p.kind == PunchKind::ClockIn))
            .unwrap_or(false)
    }
}
