//! Shared helpers for integration tests.
//!
//! Builds the coordination singletons exactly the way `main.rs` wires them,
//! minus the network: the registry doubles as the notification bus, the
//! lock table and session bridge deliver through it.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use roster_api::config::ServerConfig;
use roster_api::locks::LockTable;
use roster_api::session::{MemorySessionStore, SessionBridge};
use roster_api::state::AppState;
use roster_api::ws::ConnectionRegistry;
use roster_core::identity::Identity;
use roster_core::roles::{RoleSet, ROLE_ADMIN, ROLE_USER};
use roster_core::types::DbId;
use roster_core::wire::ServerMessage;
use roster_events::NotificationBus;

/// A delivery captured by [`RecordingBus`].
#[derive(Debug, Clone)]
pub enum Sent {
    Broadcast { filter: RoleSet, msg: ServerMessage },
    Unicast { identity_id: DbId, msg: ServerMessage },
}

/// Notification bus that records every delivery instead of sending it.
#[derive(Default)]
pub struct RecordingBus {
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl NotificationBus for RecordingBus {
    async fn broadcast(&self, filter: &RoleSet, msg: ServerMessage) {
        self.sent.lock().await.push(Sent::Broadcast {
            filter: filter.clone(),
            msg,
        });
    }

    async fn unicast(&self, identity_id: DbId, msg: ServerMessage) {
        self.sent.lock().await.push(Sent::Unicast { identity_id, msg });
    }
}

/// The default observer set: admin + regular user roles.
pub fn observers() -> RoleSet {
    [ROLE_ADMIN, ROLE_USER].into_iter().collect()
}

pub fn admin_identity() -> Identity {
    Identity::new(1, "admin", [ROLE_ADMIN, ROLE_USER].into_iter().collect())
}

pub fn user_identity(id: DbId, username: &str) -> Identity {
    Identity::new(id, username, [ROLE_USER].into_iter().collect())
}

/// Config used by in-process tests; never read from the environment so
/// tests stay hermetic.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:4200".into()],
        request_timeout_secs: 5,
        shutdown_timeout_secs: 5,
        session_secret: "test-secret".into(),
        session_ttl_mins: 60,
        ping_interval_secs: 1,
        pong_timeout_secs: 2,
        observer_roles: observers(),
    }
}

/// Fully wired application state plus handles to the singletons.
pub struct TestApp {
    pub state: AppState,
    pub config: ServerConfig,
    pub registry: Arc<ConnectionRegistry>,
    pub locks: Arc<LockTable>,
    pub sessions: Arc<SessionBridge>,
    pub store: Arc<MemorySessionStore>,
}

pub fn build_test_app() -> TestApp {
    let config = test_config();

    let registry = Arc::new(ConnectionRegistry::new());
    let locks = Arc::new(LockTable::new(
        registry.clone(),
        config.observer_roles.clone(),
    ));
    let store = Arc::new(MemorySessionStore::new());
    let sessions = Arc::new(SessionBridge::new(
        store.clone(),
        registry.clone(),
        Arc::clone(&registry),
        Arc::clone(&locks),
        config.session_secret.clone(),
        config.session_ttl_mins,
        config.observer_roles.clone(),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        locks: Arc::clone(&locks),
        sessions: Arc::clone(&sessions),
    };

    TestApp {
        state,
        config,
        registry,
        locks,
        sessions,
        store,
    }
}

impl TestApp {
    /// Open a session for `identity` and return the `Cookie` header value
    /// a logged-in client would send.
    pub async fn login(&self, identity: Identity) -> String {
        let record = self.sessions.open_session(identity).await;
        self.sessions.cookie_for(&record)
    }
}

/// Decode a WebSocket text frame back into a wire message.
pub fn decode_frame(msg: &axum::extract::ws::Message) -> ServerMessage {
    match msg {
        axum::extract::ws::Message::Text(text) => {
            serde_json::from_str(text).expect("frame should be a wire message")
        }
        other => panic!("expected a text frame, got: {other:?}"),
    }
}

/// Drain every message currently queued on a connection's receiver.
pub fn drain(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<axum::extract::ws::Message>,
) -> Vec<axum::extract::ws::Message> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}
