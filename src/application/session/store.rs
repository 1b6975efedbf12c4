//! Session store: who is signed in
//!
//! Holds at most one active [`Identity`] and mirrors it into a
//! [`SessionStorage`] cell so it survives a restart.
//!
//! States: `Uninitialized → Loading → {Authenticated, Anonymous}`,
//! `Anonymous → Loading → Authenticated` on login and
//! `Authenticated → Anonymous` on logout. An authenticated session never
//! switches identity in place; sign out first.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::application::identity::{MockEmailRoleResolver, RoleResolver};
use crate::config::SessionConfig;
use crate::domain::{DomainError, DomainResult, Identity};
use crate::infrastructure::SessionStorage;
use crate::notifications::{Event, SessionEvent, SharedEventBus};

/// Default key of the persisted session record
pub const DEFAULT_SESSION_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated(Identity),
    Anonymous,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Uninitialized | SessionState::Loading)
    }
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    /// Logins that have started but not resolved
    in_flight: u32,
}

/// Single source of truth for the signed-in identity.
///
/// Construct one per application and pass it (usually as `Arc<SessionStore>`)
/// to whatever mounts dashboards.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    resolver: Arc<dyn RoleResolver>,
    key: String,
    login_latency: Duration,
    event_bus: Option<SharedEventBus>,
    inner: RwLock<Inner>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            resolver: Arc::new(MockEmailRoleResolver),
            key: DEFAULT_SESSION_KEY.to_string(),
            login_latency: Duration::ZERO,
            event_bus: None,
            inner: RwLock::new(Inner {
                state: SessionState::Uninitialized,
                in_flight: 0,
            }),
        }
    }

    pub fn from_config(storage: Arc<dyn SessionStorage>, config: &SessionConfig) -> Self {
        Self::new(storage)
            .with_key(config.storage_key.clone())
            .with_login_latency(config.login_latency())
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn RoleResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_login_latency(mut self, latency: Duration) -> Self {
        self.login_latency = latency;
        self
    }

    pub fn with_event_bus(mut self, event_bus: SharedEventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Restore the persisted identity, if any.
    ///
    /// A missing, unreadable or unparseable record means "no session"; it is
    /// logged, never returned as an error. A record that does not parse is
    /// removed so it is not read again. Calling this again later re-reads
    /// storage, which is how a reload is modelled.
    pub async fn initialize(&self) -> Option<Identity> {
        let mut inner = self.inner.write().await;
        if inner.in_flight > 0 {
            debug!("Login in flight; skipping session restore");
            return None;
        }
        inner.state = SessionState::Loading;

        let restored = self.read_persisted().await;
        inner.state = match &restored {
            Some(identity) => {
                info!(identity_id = %identity.id, role = %identity.role, "Session restored");
                SessionState::Authenticated(identity.clone())
            }
            None => {
                debug!("No persisted session");
                SessionState::Anonymous
            }
        };
        restored
    }

    async fn read_persisted(&self) -> Option<Identity> {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, "Session storage unreadable, starting signed out: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(key = %self.key, "Discarding corrupt session record: {}", e);
                if let Err(e) = self.storage.remove(&self.key).await {
                    warn!(key = %self.key, "Failed to remove corrupt session record: {}", e);
                }
                None
            }
        }
    }

    /// Sign in.
    ///
    /// The password is accepted as-is; input validation happens before this
    /// call (see [`LoginForm`](crate::interfaces::LoginForm)). Overlapping
    /// calls are not serialized: each one persists its identity when it
    /// resolves (last write wins) and the store leaves `Loading` once the
    /// last of them has resolved.
    ///
    /// Fails only when the store has not been initialized or an identity is
    /// already signed in.
    pub async fn login(&self, email: &str, _password: &str) -> DomainResult<Identity> {
        {
            let mut inner = self.inner.write().await;
            match &inner.state {
                SessionState::Uninitialized => {
                    return Err(DomainError::InvalidState(
                        "session store is not initialized".into(),
                    ))
                }
                SessionState::Authenticated(current) => {
                    return Err(DomainError::InvalidState(format!(
                        "{} is already signed in; log out first",
                        current.email
                    )))
                }
                SessionState::Loading | SessionState::Anonymous => {}
            }
            inner.state = SessionState::Loading;
            inner.in_flight += 1;
        }

        if !self.login_latency.is_zero() {
            tokio::time::sleep(self.login_latency).await;
        }

        let identity = self.resolver.resolve(email);

        let mut inner = self.inner.write().await;
        inner.in_flight = inner.in_flight.saturating_sub(1);
        self.persist(&identity).await;
        inner.state = if inner.in_flight == 0 {
            SessionState::Authenticated(identity.clone())
        } else {
            SessionState::Loading
        };
        drop(inner);

        info!(identity_id = %identity.id, role = %identity.role, "Signed in");
        metrics::counter!("energyflow_logins_total", "role" => identity.role.as_str()).increment(1);
        self.publish(Event::SessionStarted(session_event(&identity)));
        Ok(identity)
    }

    async fn persist(&self, identity: &Identity) {
        let record = match serde_json::to_string(identity) {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to serialize session record: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, record).await {
            warn!(key = %self.key, "Failed to persist session: {}", e);
        }
    }

    /// Sign out and forget the persisted record. Safe to call when signed out.
    pub async fn logout(&self) {
        let mut inner = self.inner.write().await;
        let previous = inner.state.identity().cloned();
        // A pending login still resolves afterwards; callers decide whether
        // to honour it.
        inner.state = if inner.in_flight > 0 {
            SessionState::Loading
        } else {
            SessionState::Anonymous
        };
        if let Err(e) = self.storage.remove(&self.key).await {
            warn!(key = %self.key, "Failed to remove persisted session: {}", e);
        }
        drop(inner);

        if let Some(identity) = previous {
            info!(identity_id = %identity.id, "Signed out");
            metrics::counter!("energyflow_logouts_total").increment(1);
            self.publish(Event::SessionEnded(session_event(&identity)));
        }
    }

    pub async fn current_identity(&self) -> Option<Identity> {
        self.inner.read().await.state.identity().cloned()
    }

    /// True until `initialize` completes and while a login is in flight.
    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.state.is_loading()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state.clone()
    }

    fn publish(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

fn session_event(identity: &Identity) -> SessionEvent {
    SessionEvent {
        identity_id: identity.id.clone(),
        email: identity.email.clone(),
        role: identity.role,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::infrastructure::InMemorySessionStorage;
    use async_trait::async_trait;

    async fn ready_store(storage: Arc<InMemorySessionStorage>) -> SessionStore {
        let store = SessionStore::new(storage);
        store.initialize().await;
        store
    }

    #[tokio::test]
    async fn starts_loading_until_initialized() {
        let store = SessionStore::new(Arc::new(InMemorySessionStorage::new()));
        assert!(store.is_loading().await);
        assert_eq!(store.state().await, SessionState::Uninitialized);

        assert_eq!(store.initialize().await, None);
        assert!(!store.is_loading().await);
        assert_eq!(store.state().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn login_resolves_role_from_email() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let store = ready_store(storage).await;

        let identity = store.login("tech@campus.edu", "demo123").await.unwrap();
        assert_eq!(identity.role, Role::Technician);
        assert_eq!(identity.email, "tech@campus.edu");
        assert_eq!(store.current_identity().await, Some(identity));
    }

    #[tokio::test]
    async fn login_persists_record() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let store = ready_store(storage.clone()).await;

        let identity = store.login("gov@ministry.gov", "demo123").await.unwrap();

        let raw = storage.get("user").await.unwrap().expect("record written");
        let stored: Identity = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, identity);
    }

    #[tokio::test]
    async fn logout_clears_memory_and_storage() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let store = ready_store(storage.clone()).await;
        store.login("admin@x.com", "x").await.unwrap();

        store.logout().await;
        assert_eq!(store.current_identity().await, None);
        assert!(storage.is_empty());

        // Reload
        assert_eq!(store.initialize().await, None);
        assert_eq!(store.current_identity().await, None);
    }

    #[tokio::test]
    async fn logout_when_signed_out_is_a_no_op() {
        let store = ready_store(Arc::new(InMemorySessionStorage::new())).await;
        store.logout().await;
        store.logout().await;
        assert_eq!(store.state().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn fresh_store_restores_identity() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let first = ready_store(storage.clone()).await;
        let identity = first.login("facility@campus.edu", "pw").await.unwrap();

        let second = SessionStore::new(storage);
        assert_eq!(second.initialize().await, Some(identity.clone()));
        assert_eq!(second.current_identity().await, Some(identity));
    }

    #[tokio::test]
    async fn corrupt_record_is_treated_as_signed_out() {
        let storage = Arc::new(InMemorySessionStorage::new());
        storage.set("user", "{not json".into()).await.unwrap();

        let store = SessionStore::new(storage.clone());
        assert_eq!(store.initialize().await, None);
        assert_eq!(store.state().await, SessionState::Anonymous);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn wrong_shape_is_treated_as_signed_out() {
        let storage = Arc::new(InMemorySessionStorage::new());
        storage
            .set("user", r#"{"id":"1","email":"a@b.c","role":"superuser","name":"x"}"#.into())
            .await
            .unwrap();

        let store = SessionStore::new(storage);
        assert_eq!(store.initialize().await, None);
    }

    #[tokio::test]
    async fn custom_key_is_used() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let store = SessionStore::new(storage.clone()).with_key("session");
        store.initialize().await;
        store.login("tech@campus.edu", "demo123").await.unwrap();

        assert!(storage.get("user").await.unwrap().is_none());
        assert!(storage.get("session").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn login_requires_initialize() {
        let store = SessionStore::new(Arc::new(InMemorySessionStorage::new()));
        let err = store.login("tech@campus.edu", "demo123").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn identity_does_not_change_in_place() {
        let store = ready_store(Arc::new(InMemorySessionStorage::new())).await;
        let tech = store.login("tech@campus.edu", "demo123").await.unwrap();

        let err = store.login("admin@x.com", "x").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(store.current_identity().await, Some(tech));
    }

    #[tokio::test(start_paused = true)]
    async fn loading_while_login_in_flight() {
        let store = Arc::new(
            ready_store(Arc::new(InMemorySessionStorage::new()))
                .await
                .with_login_latency(Duration::from_secs(1)),
        );

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.login("tech@campus.edu", "demo123").await })
        };
        tokio::task::yield_now().await;
        assert!(store.is_loading().await);
        assert_eq!(store.current_identity().await, None);

        let identity = task.await.unwrap().unwrap();
        assert!(!store.is_loading().await);
        assert_eq!(store.current_identity().await, Some(identity));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_logins_last_write_wins() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let store = Arc::new(
            ready_store(storage.clone())
                .await
                .with_login_latency(Duration::from_secs(1)),
        );

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.login("tech@campus.edu", "a").await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        let second = {
            let store = store.clone();
            tokio::spawn(async move { store.login("gov@ministry.gov", "b").await })
        };

        first.await.unwrap().unwrap();
        // First resolved, second still pending.
        assert!(store.is_loading().await);

        let last = second.await.unwrap().unwrap();
        assert_eq!(store.current_identity().await, Some(last.clone()));
        let stored: Identity =
            serde_json::from_str(&storage.get("user").await.unwrap().unwrap()).unwrap();
        assert_eq!(stored, last);
    }

    struct FailingStorage;

    #[async_trait]
    impl SessionStorage for FailingStorage {
        async fn get(&self, _key: &str) -> DomainResult<Option<String>> {
            Err(DomainError::Storage("disk on fire".into()))
        }
        async fn set(&self, _key: &str, _value: String) -> DomainResult<()> {
            Err(DomainError::Storage("disk on fire".into()))
        }
        async fn remove(&self, _key: &str) -> DomainResult<()> {
            Err(DomainError::Storage("disk on fire".into()))
        }
    }

    #[tokio::test]
    async fn storage_failures_do_not_surface() {
        let store = SessionStore::new(Arc::new(FailingStorage));
        assert_eq!(store.initialize().await, None);

        let identity = store.login("admin@x.com", "x").await.unwrap();
        assert_eq!(store.current_identity().await, Some(identity));

        store.logout().await;
        assert_eq!(store.current_identity().await, None);
    }

    #[tokio::test]
    async fn publishes_session_events() {
        let bus = crate::notifications::create_event_bus();
        let mut sub = bus.subscribe();
        let store = SessionStore::new(Arc::new(InMemorySessionStorage::new())).with_event_bus(bus);
        store.initialize().await;

        store.login("admin@x.com", "x").await.unwrap();
        store.logout().await;

        assert_eq!(sub.recv().await.unwrap().event.event_type(), "session_started");
        assert_eq!(sub.recv().await.unwrap().event.event_type(), "session_ended");
    }
}
