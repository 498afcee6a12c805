//! Session lifecycle on top of tower-sessions.
//!
//! # Responsibilities
//! - Configure the tower-sessions layer (cookie name and attributes, expiry)
//! - Load the typed payload before the handler runs and write it back after
//!
//! # Design Decisions
//! - Cookie handling and persistence belong to tower-sessions; this module
//!   only translates between its key/value record and `SessionData`
//! - Fresh sessions are only stored once something is written to them, so
//!   cookie-less `/health` checks never allocate a session
//! - Sliding expiry: every request on a stored session extends it by the
//!   configured lifetime

use axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};

use crate::config::{AppEnv, SessionConfig};
use crate::http::error::AppError;
use crate::session::handle::Session;
use crate::session::store::MemorySessionStore;

/// Longest lifetime browsers honour for a cookie (400 days).
pub const MAX_LIFETIME_SECS: u64 = 400 * 24 * 60 * 60;

/// Attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub lifetime_secs: u64,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_config(config: &SessionConfig, env: AppEnv) -> Self {
        Self {
            name: config.cookie_name.clone(),
            lifetime_secs: config.lifetime_secs,
            secure: config.secure_for(env),
        }
    }

    /// Inactivity window, clamped to what a cookie can carry.
    pub fn max_age(&self) -> time::Duration {
        let secs = self.lifetime_secs.min(MAX_LIFETIME_SECS);
        time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

/// The session store plus the cookie settings it is served with.
#[derive(Clone)]
pub struct SessionManager {
    store: MemorySessionStore,
    cookie: CookieSettings,
}

impl SessionManager {
    pub fn new(store: MemorySessionStore, cookie: CookieSettings) -> Self {
        Self { store, cookie }
    }

    pub fn store(&self) -> &MemorySessionStore {
        &self.store
    }

    pub fn cookie(&self) -> &CookieSettings {
        &self.cookie
    }

    /// tower-sessions layer issuing `HttpOnly; SameSite=Lax` cookies.
    pub fn layer(&self) -> SessionManagerLayer<MemorySessionStore> {
        SessionManagerLayer::new(self.store.clone())
            .with_name(self.cookie.name.clone())
            .with_http_only(true)
            .with_same_site(SameSite::Lax)
            .with_secure(self.cookie.secure)
            .with_expiry(Expiry::OnInactivity(self.cookie.max_age()))
    }
}

/// Middleware that attaches a typed `Session` to every request.
///
/// Must run inside `SessionManager::layer`.
pub async fn session_middleware(mut request: Request, next: Next) -> Response {
    let Some(backing) = request.extensions().get::<tower_sessions::Session>().cloned() else {
        tracing::error!("Session middleware ran outside the session layer");
        return AppError::MissingSession.into_response();
    };

    let session = match Session::load(backing).await {
        Ok(session) => session,
        Err(e) => return AppError::from(e).into_response(),
    };
    request.extensions_mut().insert(session.clone());

    let response = next.run(request).await;

    if let Err(e) = session.commit().await {
        return AppError::from(e).into_response();
    }
    response
}
