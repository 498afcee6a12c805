//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Login:
//!     form credentials
//!     → users.rs (directory lookup by email)
//!     → password.rs (argon2 verification)
//!     → session id rotated, user id stored
//!
//! Every request:
//!     session user id
//!     → resolver.rs (directory + tenant status)
//!     → identity.rs (CurrentUser extension)
//! ```
//!
//! # Design Decisions
//! - Identity is re-read per request; role or status changes apply immediately
//! - Password hashes are PHC strings; plaintext never leaves the login handler

pub mod identity;
pub mod password;
pub mod resolver;
pub mod totp;
pub mod users;

pub use identity::{CurrentUser, Role, TenantId, UserId, UserIdentity};
pub use resolver::{resolve_current_user, UserResolver};
pub use users::{MemoryUserDirectory, UserDirectory, UserRecord};
