//! Per-request session handle.
//!
//! The session middleware reads the typed payload out of the tower-sessions
//! session once per request and inserts a `Session` into the request
//! extensions. Handlers and the CSRF guard extract it explicitly; nothing
//! reads session state through a global. After the handler ran, `commit`
//! writes the payload back and tower-sessions persists it and sets the cookie.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::session;

use crate::auth::identity::UserId;
use crate::http::error::AppError;
use crate::records::unix_now;
use crate::security::random::random_token;
use crate::session::store::{Flash, PendingMfa, SessionData};

/// Key of the typed payload inside the tower-sessions record.
pub const DATA_KEY: &str = "portal";

/// Shared, mutable view of the current request's session.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct Session {
    backing: session::Session,
    state: Arc<Mutex<SessionState>>,
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) data: SessionData,
    /// A record for this session already exists in the store.
    pub(crate) stored: bool,
    /// Payload changed since load.
    pub(crate) dirty: bool,
    /// Move to a new id on commit.
    pub(crate) rotate: bool,
    pub(crate) destroyed: bool,
}

impl Session {
    /// Read the typed payload out of a tower-sessions session.
    pub async fn load(backing: session::Session) -> Result<Self, session::Error> {
        let data = backing.get::<SessionData>(DATA_KEY).await?;
        let state = SessionState {
            stored: data.is_some(),
            data: data.unwrap_or_default(),
            ..SessionState::default()
        };
        Ok(Self { backing, state: Arc::new(Mutex::new(state)) })
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        // A panicking handler must not take the session down with it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the client holds a stored session.
    pub fn is_new(&self) -> bool {
        !self.state().stored
    }

    pub fn created_at(&self) -> u64 {
        self.state().data.created_at
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.state().data.user_id
    }

    /// Mark the session as signed in. Clears any pending second factor.
    pub fn set_user_id(&self, user_id: UserId) {
        let mut state = self.state();
        state.data.user_id = Some(user_id);
        state.data.pending_mfa = None;
        state.dirty = true;
    }

    pub fn pending_mfa(&self) -> Option<PendingMfa> {
        self.state().data.pending_mfa
    }

    /// Park a password-verified user until the second factor is checked.
    pub fn set_pending_mfa(&self, pending: PendingMfa) {
        let mut state = self.state();
        state.data.user_id = None;
        state.data.pending_mfa = Some(pending);
        state.dirty = true;
    }

    pub fn clear_pending_mfa(&self) {
        let mut state = self.state();
        if state.data.pending_mfa.take().is_some() {
            state.dirty = true;
        }
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.state().data.csrf_token.clone()
    }

    pub fn set_csrf_token(&self, token: String) {
        let mut state = self.state();
        state.data.csrf_token = Some(token);
        state.dirty = true;
    }

    pub fn push_flash(&self, flash: Flash) {
        let mut state = self.state();
        state.data.flashes.push(flash);
        state.dirty = true;
    }

    /// Remove and return pending flash messages.
    pub fn take_flashes(&self) -> Vec<Flash> {
        let mut state = self.state();
        if state.data.flashes.is_empty() {
            return Vec::new();
        }
        state.dirty = true;
        std::mem::take(&mut state.data.flashes)
    }

    /// Move the payload to a new id with a fresh CSRF token.
    ///
    /// Called on privilege change (login) so a pre-login id cannot be reused.
    pub fn regenerate(&self) {
        let mut state = self.state();
        state.data.csrf_token = Some(random_token());
        state.data.created_at = unix_now();
        state.rotate = true;
        state.dirty = true;
    }

    /// End the session; the record and the cookie are removed on commit.
    pub fn destroy(&self) {
        let mut state = self.state();
        state.data = SessionData::default();
        state.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Write the payload back into the tower-sessions session.
    ///
    /// Untouched fresh sessions write nothing, so no record or cookie is
    /// created for them. Stored sessions refresh `last_seen_at`.
    pub async fn commit(&self) -> Result<(), session::Error> {
        let (mut data, write, rotate, destroyed) = {
            let mut state = self.state();
            let snapshot = (
                state.data.clone(),
                state.dirty || state.stored,
                state.rotate,
                state.destroyed,
            );
            state.dirty = false;
            state.rotate = false;
            snapshot
        };

        if destroyed {
            return self.backing.flush().await;
        }
        if rotate {
            self.backing.cycle_id().await?;
        }
        if write {
            let now = unix_now();
            if data.created_at == 0 {
                data.created_at = now;
            }
            data.last_seen_at = now;
            self.backing.insert(DATA_KEY, &data).await?;
            let mut state = self.state();
            state.data.created_at = data.created_at;
            state.data.last_seen_at = now;
            state.stored = true;
        }
        Ok(())
    }

    /// A handle over an empty in-memory session.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        use crate::session::store::MemorySessionStore;
        let backing = session::Session::new(None, Arc::new(MemorySessionStore::new()), None);
        Self { backing, state: Arc::new(Mutex::new(SessionState::default())) }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::MissingSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::MemorySessionStore;

    fn backed(store: &MemorySessionStore) -> session::Session {
        session::Session::new(None, Arc::new(store.clone()), None)
    }

    #[test]
    fn test_detached_session_is_clean() {
        let session = Session::detached();
        assert!(session.is_new());
        assert!(session.user_id().is_none());
        assert!(session.csrf_token().is_none());
        assert!(!session.state().dirty);
    }

    #[test]
    fn test_clones_share_state() {
        let session = Session::detached();
        let other = session.clone();
        other.set_user_id(UserId(4));
        assert_eq!(session.user_id(), Some(UserId(4)));
        assert!(session.state().dirty);
    }

    #[test]
    fn test_flashes_are_taken_once() {
        let session = Session::detached();
        session.push_flash(Flash::error("nope"));
        assert_eq!(session.take_flashes(), vec![Flash::error("nope")]);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_pending_mfa_and_user_are_exclusive() {
        let session = Session::detached();
        session.set_user_id(UserId(1));
        session.set_pending_mfa(PendingMfa { user_id: UserId(2), issued_at: 0, failed_attempts: 0 });
        assert!(session.user_id().is_none());

        session.set_user_id(UserId(2));
        assert!(session.pending_mfa().is_none());
        assert_eq!(session.user_id(), Some(UserId(2)));
    }

    #[tokio::test]
    async fn test_untouched_session_writes_nothing() {
        let store = MemorySessionStore::new();
        let backing = backed(&store);
        let session = Session::load(backing.clone()).await.unwrap();

        session.commit().await.unwrap();
        assert!(!backing.is_modified());
        assert!(backing.get::<SessionData>(DATA_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_round_trips_payload() {
        let store = MemorySessionStore::new();
        let backing = backed(&store);
        let session = Session::load(backing.clone()).await.unwrap();
        session.set_user_id(UserId(3));
        session.commit().await.unwrap();
        backing.save().await.unwrap();
        assert_eq!(store.len(), 1);

        let reopened = session::Session::new(backing.id(), Arc::new(store.clone()), None);
        let reloaded = Session::load(reopened).await.unwrap();
        assert!(!reloaded.is_new());
        assert_eq!(reloaded.user_id(), Some(UserId(3)));
        assert!(reloaded.created_at() > 0);
    }

    #[tokio::test]
    async fn test_regenerate_moves_to_new_id() {
        let store = MemorySessionStore::new();
        let backing = backed(&store);
        let session = Session::load(backing.clone()).await.unwrap();
        session.set_csrf_token("before".into());
        session.commit().await.unwrap();
        backing.save().await.unwrap();
        let old_id = backing.id();

        session.regenerate();
        session.commit().await.unwrap();
        backing.save().await.unwrap();

        assert_ne!(backing.id(), old_id);
        assert_eq!(store.len(), 1);
        assert_ne!(session.csrf_token().as_deref(), Some("before"));
    }

    #[tokio::test]
    async fn test_destroy_flushes_record() {
        let store = MemorySessionStore::new();
        let backing = backed(&store);
        let session = Session::load(backing.clone()).await.unwrap();
        session.set_user_id(UserId(1));
        session.commit().await.unwrap();
        backing.save().await.unwrap();

        session.destroy();
        assert!(session.is_destroyed());
        assert!(session.user_id().is_none());
        session.commit().await.unwrap();
        assert!(store.is_empty());
    }
}
