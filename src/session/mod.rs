//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (cookie)
//!     → tower-sessions layer (cookie ↔ record id, lazy load from store.rs)
//!     → manager.rs (typed payload loaded into handle.rs)
//!     → CSRF guard / resolver / handlers read and mutate it
//!     → handle.rs commit (write back, rotate, flush)
//!     → tower-sessions layer (save, Set-Cookie)
//!
//! Background:
//!     sweeper.rs → store.rs (purge expired records)
//! ```
//!
//! # Design Decisions
//! - Session state is passed explicitly per request, never looked up globally
//! - The store is the only cross-request shared state; last write wins

pub mod handle;
pub mod manager;
pub mod store;
pub mod sweeper;

pub use handle::Session;
pub use manager::{session_middleware, CookieSettings, SessionManager};
pub use store::{Flash, FlashLevel, MemorySessionStore, PendingMfa, SessionData};
pub use sweeper::SessionSweeper;
