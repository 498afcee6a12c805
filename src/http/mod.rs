//! HTTP server, errors and HTML helpers.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, filter chain, graceful shutdown)
//!     → request.rs (add or keep request ID)
//!     → [security filters, session, gates]
//!     → handler
//!     → response.rs (HTML rendering) / error.rs (JSON errors)
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::AppError;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
