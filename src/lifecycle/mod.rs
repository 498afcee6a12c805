//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! startup.rs:
//!     validated config → metrics exporter → stores + router
//!     → session sweeper → bind listener (plain or TLS) → serve
//!
//! signals.rs:
//!     SIGINT / SIGTERM → resolve the wait in startup.rs
//!
//! shutdown.rs:
//!     broadcast to server + sweeper → drain → abort after grace period
//! ```
//!
//! # Design Decisions
//! - Startup errors are fatal and reported before any traffic is accepted
//! - Configuration is fixed for the life of the process (no SIGHUP reload)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupError};
