//! Request filters: hosts, headers, CSRF.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (policy headers added to whatever response comes back)
//!     → hosts.rs (reject disallowed Host)
//!     → [session opened]
//!     → csrf.rs (reject state-changing requests without a matching token)
//!     → Pass to resolver and gates
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Rejections are terminal for the request and never retried
//! - No trust in client input

pub mod csrf;
pub mod headers;
pub mod hosts;
pub mod random;

pub use csrf::{csrf_middleware, CsrfGuard};
pub use headers::SecurityHeaders;
pub use hosts::{host_validation_middleware, AllowedHosts};
