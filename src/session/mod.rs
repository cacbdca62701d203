//! Process-wide identity store.
//!
//! The store starts in `Loading`, is resolved once by [`IdentityStore::bootstrap`]
//! and cleared by [`IdentityStore::logout`]. Clones share the same state, so
//! the store is handed around by value instead of living in a global.

pub mod poller;

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::types::Credentials;
use crate::api::Backend;
use crate::error::Result;
use crate::models::{BrokerStatus, Role, User};

pub use poller::ApprovalPoller;

/// Browser-storage key used as the cross-tab login signal
pub const AUTH_TOKEN_KEY: &str = "authToken";

const EVENT_CAPACITY: usize = 16;

/// Resolution state of the current session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Bootstrap has not finished; routes should show a placeholder
    Loading,
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

/// Login changes observed by interested views
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn(User),
    LoggedOut,
    /// A storage key changed, possibly from another tab
    StorageChanged { key: String, value: Option<String> },
}

/// Shared identity of the current user
#[derive(Clone)]
pub struct IdentityStore {
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl IdentityStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(SessionState::Loading)),
            events,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.snapshot().user().cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Resolve the session once at startup. Failures leave the store anonymous.
    pub async fn bootstrap(&self, backend: &dyn Backend) -> SessionState {
        let user = match backend.check_session().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("No active session");
                self.set(SessionState::Anonymous);
                return SessionState::Anonymous;
            }
            Err(err) => {
                warn!("Session check failed, continuing anonymously: {err}");
                self.set(SessionState::Anonymous);
                return SessionState::Anonymous;
            }
        };

        let user = with_broker_status(backend, user).await;
        info!("Session resolved for {} ({:?})", user.email, user.role);
        let state = SessionState::Authenticated(user);
        self.set(state.clone());
        state
    }

    pub async fn login(&self, backend: &dyn Backend, credentials: &Credentials) -> Result<User> {
        let user = backend.login(credentials).await?;
        let user = with_broker_status(backend, user).await;

        info!("Logged in as {}", user.email);
        self.set(SessionState::Authenticated(user.clone()));
        self.emit(SessionEvent::LoggedIn(user.clone()));
        Ok(user)
    }

    /// Clear the identity. The local session ends even if the backend call fails.
    pub async fn logout(&self, backend: &dyn Backend) {
        if let Err(err) = backend.logout().await {
            warn!("Logout request failed: {err}");
        }
        self.set(SessionState::Anonymous);
        self.emit(SessionEvent::LoggedOut);
        info!("Logged out");
    }

    /// Forward a storage change (e.g. from another tab) to subscribers.
    pub fn notify_storage_change(&self, key: &str, value: Option<String>) {
        self.emit(SessionEvent::StorageChanged {
            key: key.to_string(),
            value,
        });
    }

    /// Merge broker fields into the stored user. Ignored for non-brokers.
    pub fn apply_broker_status(&self, status: &BrokerStatus) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let SessionState::Authenticated(user) = &mut *state {
            if user.role == Role::Broker {
                user.is_approved = status.is_approved;
            }
        }
    }

    /// Patch the cached user after a profile edit.
    pub fn patch_user(&self, patch: impl FnOnce(&mut User)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let SessionState::Authenticated(user) = &mut *state {
            patch(user);
        }
    }

    /// True while the identity is a broker awaiting approval.
    pub fn needs_approval_poll(&self) -> bool {
        self.snapshot()
            .user()
            .map(User::is_pending_broker)
            .unwrap_or(false)
    }

    fn set(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn with_broker_status(backend: &dyn Backend, mut user: User) -> User {
    if user.role != Role::Broker {
        return user;
    }
    match backend.broker_me().await {
        Ok(status) => user.is_approved = status.is_approved,
        Err(err) => warn!("Could not load broker status: {err}"),
    }
    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{failure, user, FakeBackend};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn bootstrap_starts_loading_and_resolves_user() {
        let backend = FakeBackend::default();
        *backend.session.lock().unwrap() = Some(user(Role::User, false));
        let store = IdentityStore::new();
        assert!(store.snapshot().is_loading());

        let state = store.bootstrap(&backend).await;
        assert_eq!(state.user().map(|u| u.role), Some(Role::User));
        assert_eq!(backend.broker_me_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bootstrap_merges_broker_approval() {
        let backend = FakeBackend::default();
        *backend.session.lock().unwrap() = Some(user(Role::Broker, false));
        backend.broker_statuses.lock().unwrap().push_back(Ok(BrokerStatus {
            is_approved: true,
            ..BrokerStatus::default()
        }));

        let store = IdentityStore::new();
        store.bootstrap(&backend).await;

        assert!(store.current_user().unwrap().is_approved);
        assert!(!store.needs_approval_poll());
    }

    #[tokio::test]
    async fn failed_session_check_is_anonymous() {
        let backend = FakeBackend::default();
        backend.session_fails.store(true, Ordering::SeqCst);

        let store = IdentityStore::new();
        assert_eq!(store.bootstrap(&backend).await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn failed_broker_lookup_keeps_user() {
        let backend = FakeBackend::default();
        *backend.session.lock().unwrap() = Some(user(Role::Broker, false));
        backend.broker_statuses.lock().unwrap().push_back(Err(failure()));

        let store = IdentityStore::new();
        store.bootstrap(&backend).await;

        let current = store.current_user().unwrap();
        assert_eq!(current.role, Role::Broker);
        assert!(store.needs_approval_poll());
    }

    #[tokio::test]
    async fn login_and_logout_emit_events() {
        let backend = FakeBackend::default();
        *backend.session.lock().unwrap() = Some(user(Role::User, false));
        let store = IdentityStore::new();
        let mut events = store.subscribe();

        let credentials = Credentials {
            email: "account@example.com".to_string(),
            password: "correct-horse".to_string(),
        };
        store.login(&backend, &credentials).await.unwrap();
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::LoggedIn(_)));

        backend.fail_mutations.store(true, Ordering::SeqCst);
        store.logout(&backend).await;
        assert_eq!(backend.logout_calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
        assert_eq!(store.snapshot(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn wrong_password_leaves_store_untouched() {
        let backend = FakeBackend::default();
        *backend.session.lock().unwrap() = Some(user(Role::User, false));
        let store = IdentityStore::new();
        store.bootstrap(&backend).await;
        store.logout(&backend).await;

        let credentials = Credentials {
            email: "account@example.com".to_string(),
            password: "guess".to_string(),
        };
        assert!(store.login(&backend, &credentials).await.is_err());
        assert_eq!(store.snapshot(), SessionState::Anonymous);
    }

    #[test]
    fn patch_user_updates_cached_copy() {
        let store = IdentityStore::new();
        store.set(SessionState::Authenticated(user(Role::User, false)));
        store.patch_user(|u| u.name = "Renamed".to_string());
        assert_eq!(store.current_user().unwrap().name, "Renamed");
    }
}
