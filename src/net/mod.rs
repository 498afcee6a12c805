//! Sockets and TLS material.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (parse address, bind TCP)
//!     → tls.rs (optional: load PEM certificate and key)
//!     → Hand off to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bind failures are fatal at startup
//! - TLS is optional and handled by axum-server's rustls acceptor

pub mod listener;
pub mod tls;

pub use listener::{bind, parse_bind_address, ListenerError};
pub use tls::load_tls_config;
