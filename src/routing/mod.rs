//! Route access control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path + resolved CurrentUser)
//!     → policy.rs (path → Policy via the table)
//!     → matcher.rs (evaluate exact / prefix conditions)
//!     → gates.rs (Auth, TenantAdmin, PlatformAdmin in order)
//!     → Pass to handler, or 303 redirect
//!
//! Table Construction (at startup):
//!     PolicyTable::standard()
//!     → Freeze behind Arc, shared by every request
//! ```
//!
//! # Design Decisions
//! - Policies compiled at startup, immutable at runtime
//! - No regex in hot path (exact and prefix matching only)
//! - Deterministic: same path always yields the same policy
//! - Every route is covered: unlisted paths require authentication

pub mod gates;
pub mod matcher;
pub mod policy;

pub use gates::{Gate, GateDecision, DASHBOARD_PATH, LOGIN_PATH};
pub use policy::{gate_middleware, Policy, PolicyTable};
