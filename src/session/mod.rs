//! Session lifecycle: the only writer of authentication state.
//!
//! The store owns the token/user pair, keeps it persisted across runs, and
//! feeds an auth-state watch channel the route guard observes. Teardown
//! (logout or a 401 on any non-login endpoint) is idempotent and
//! order-independent: clearing an already-empty session is a no-op, so a
//! straggler 401 landing after a logout changes nothing.

pub mod claims;
pub mod storage;

use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::watch;

use crate::api::{ApiClient, ApiError};
use crate::model::User;
use crate::query::QueryCache;
use storage::SessionStorage;

/// Where the client stands with respect to authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Persisted state has not been read yet; nobody may decide.
    Restoring,
    SignedIn,
    SignedOut,
}

/// An authenticated session. Token and user travel together; there is never
/// a half-set session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Failures surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("falha ao persistir a sessão: {0}")]
    Storage(String),
}

struct SessionInner {
    api: Arc<ApiClient>,
    queries: Arc<QueryCache>,
    storage: SessionStorage,
    current: RwLock<Option<Session>>,
    auth_tx: watch::Sender<AuthState>,
}

impl SessionInner {
    /// Full teardown: persisted state, cached queries, in-memory session,
    /// bearer token. Safe to run any number of times in any order.
    fn teardown(&self) {
        self.storage.clear();
        self.queries.clear();
        self.api.clear_token();
        *self.current.write() = None;
        self.auth_tx.send_replace(AuthState::SignedOut);
    }
}

/// Owner of the authenticated-user/token state.
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    /// Wire the store to its collaborators and register the teardown hook
    /// on the API client. The hook holds a weak reference, so the client
    /// never keeps a dropped store alive.
    pub fn new(api: Arc<ApiClient>, queries: Arc<QueryCache>, storage: SessionStorage) -> Self {
        let (auth_tx, _) = watch::channel(AuthState::Restoring);
        let inner = Arc::new(SessionInner {
            api: api.clone(),
            queries,
            storage,
            current: RwLock::new(None),
            auth_tx,
        });

        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        api.set_unauthorized_handler(move || {
            if let Some(inner) = weak.upgrade() {
                inner.teardown();
            }
        });

        Self { inner }
    }

    /// Read the persisted session into memory. Resolves the auth state
    /// either way, so the route guard can leave `Checking`.
    pub fn restore(&self) {
        match self.inner.storage.load() {
            Some((token, user)) => {
                tracing::info!(email = %user.email, "session restored");
                self.inner.api.set_token(token.clone());
                *self.inner.current.write() = Some(Session { token, user });
                self.inner.auth_tx.send_replace(AuthState::SignedIn);
            }
            None => {
                *self.inner.current.write() = None;
                self.inner.auth_tx.send_replace(AuthState::SignedOut);
            }
        }
    }

    /// Authenticate against the backend and establish the session.
    ///
    /// The identity is derived from the returned token's claims (see
    /// [`claims::identity_from_token`]). Persisted and in-memory state only
    /// change after everything succeeded; a failure leaves the store as it
    /// was.
    pub async fn login(&self, email: &str, senha: &str) -> Result<User, SessionError> {
        let response = self.inner.api.authenticate(email, senha).await?;
        let user = claims::identity_from_token(&response.token, email)?;

        self.inner
            .storage
            .save(&response.token, &user)
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        self.inner.api.set_token(response.token.clone());
        *self.inner.current.write() = Some(Session {
            token: response.token,
            user: user.clone(),
        });
        self.inner.auth_tx.send_replace(AuthState::SignedIn);
        tracing::info!(email = %user.email, role = user.role.as_str(), "login succeeded");
        Ok(user)
    }

    /// End the session: clear persisted state, purge the query cache, drop
    /// the token, notify the guard. Safe to call when already signed out.
    pub fn logout(&self) {
        self.inner.teardown();
        tracing::info!("logged out");
    }

    /// True iff token and user are both present.
    pub fn is_authenticated(&self) -> bool {
        self.inner.current.read().is_some()
    }

    /// True only while the initial restore has not completed.
    pub fn is_loading(&self) -> bool {
        *self.inner.auth_tx.borrow() == AuthState::Restoring
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.current.read().as_ref().map(|s| s.user.clone())
    }

    /// Watch auth-state transitions (used by the route guard).
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, CacheConfig};
    use crate::model::Role;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SessionStore {
        let api = Arc::new(
            ApiClient::new(&ApiConfig {
                base_url: "http://localhost:8080/api".into(),
                timeout_seconds: 5,
            })
            .unwrap(),
        );
        let queries = Arc::new(QueryCache::new(api.clone(), &CacheConfig::default()));
        SessionStore::new(api, queries, SessionStorage::new(dir.path().to_path_buf()))
    }

    fn user() -> User {
        User {
            id: "1".into(),
            email: "ana@exemplo.com".into(),
            nome: "Ana".into(),
            role: Role::Motorista,
        }
    }

    #[test]
    fn test_initial_state_is_restoring() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.is_loading());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_restore_with_persisted_session_signs_in() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        SessionStorage::new(dir.path().to_path_buf())
            .save("tok-abc", &user())
            .unwrap();
        store.restore();

        assert!(!store.is_loading());
        assert!(store.is_authenticated());
        assert_eq!(store.current_user().unwrap().email, "ana@exemplo.com");
        assert_eq!(*store.subscribe().borrow(), AuthState::SignedIn);
    }

    #[test]
    fn test_restore_with_nothing_persisted_signs_out() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.restore();

        assert!(!store.is_loading());
        assert!(!store.is_authenticated());
        assert_eq!(*store.subscribe().borrow(), AuthState::SignedOut);
    }

    #[test]
    fn test_restore_with_corrupt_user_clears_everything() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        std::fs::write(dir.path().join("token"), "tok").unwrap();
        std::fs::write(dir.path().join("user.json"), "{broken").unwrap();
        store.restore();

        assert!(!store.is_authenticated());
        assert!(SessionStorage::new(dir.path().to_path_buf()).is_empty());
    }

    #[test]
    fn test_logout_clears_storage_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        SessionStorage::new(dir.path().to_path_buf())
            .save("tok-abc", &user())
            .unwrap();
        store.restore();
        assert!(store.is_authenticated());

        store.logout();
        assert!(!store.is_authenticated());
        assert!(SessionStorage::new(dir.path().to_path_buf()).is_empty());
        assert_eq!(store.inner.queries.cached_entries(), 0);
        assert!(!store.inner.api.has_token());

        // A second logout, or a straggler 401 teardown, is a no-op.
        store.logout();
        assert!(!store.is_authenticated());
        assert_eq!(*store.subscribe().borrow(), AuthState::SignedOut);
    }

    #[test]
    fn test_unauthorized_teardown_signs_out() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        SessionStorage::new(dir.path().to_path_buf())
            .save("tok-abc", &user())
            .unwrap();
        store.restore();
        assert!(store.is_authenticated());

        // Simulate a non-login endpoint answering 401.
        store.inner.api.notify_unauthorized();

        assert!(!store.is_authenticated());
        assert!(SessionStorage::new(dir.path().to_path_buf()).is_empty());
        assert_eq!(*store.subscribe().borrow(), AuthState::SignedOut);
    }
}
