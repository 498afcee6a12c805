//! Logs and metrics.
//!
//! # Data Flow
//! ```text
//! Filters, handlers, sweeper
//!     → tracing events (logging.rs installs the subscriber)
//!     → metrics facade (metrics.rs installs the Prometheus recorder)
//!
//! Request spans come from tower-http's TraceLayer and carry the request id.
//! ```
//!
//! # Design Decisions
//! - JSON output for production, compact text for development
//! - Passwords, session ids and CSRF tokens never appear in events

pub mod logging;
pub mod metrics;
