use std::sync::Arc;

use serde::Serialize;

use roster_core::identity::Identity;
use roster_core::roles::RoleSet;
use roster_core::types::{DbId, Timestamp};
use roster_core::wire::ServerMessage;
use roster_events::NotificationBus;

use crate::locks::LockTable;
use crate::session::cookie::{self, SESSION_COOKIE_NAME};
use crate::session::store::{SessionRecord, SessionStore};
use crate::ws::ConnectionRegistry;

/// One row of the admin session listing.
#[derive(Debug, Serialize)]
pub struct ActiveSession {
    pub token: String,
    pub valid_until: Timestamp,
    pub user_id: DbId,
    pub username: String,
    #[serde(rename = "isCurrentSession")]
    pub is_current_session: bool,
}

/// Bridges transport-level credentials to identities.
///
/// On the way in, resolves the signed session cookie carried by an HTTP
/// request or WebSocket handshake to an [`Identity`]; every resolution
/// failure degrades to anonymous instead of rejecting. On the way out,
/// destroys sessions (logout, forced logout) and tells the affected and
/// observing clients about it.
pub struct SessionBridge {
    store: Arc<dyn SessionStore>,
    bus: Arc<dyn NotificationBus>,
    registry: Arc<ConnectionRegistry>,
    locks: Arc<LockTable>,
    secret: String,
    ttl: chrono::Duration,
    observers: RoleSet,
}

impl SessionBridge {
    pub fn new(
        store: Arc<dyn SessionStore>,
        bus: Arc<dyn NotificationBus>,
        registry: Arc<ConnectionRegistry>,
        locks: Arc<LockTable>,
        secret: impl Into<String>,
        session_ttl_mins: i64,
        observers: RoleSet,
    ) -> Self {
        Self {
            store,
            bus,
            registry,
            locks,
            secret: secret.into(),
            ttl: chrono::Duration::minutes(session_ttl_mins),
            observers,
        }
    }

    /// Resolve a `Cookie` request header to an identity.
    ///
    /// Missing cookie, bad signature, unknown token, and expired session
    /// all resolve to `None` (anonymous). Never errors: an unauthenticated
    /// participant is a valid, non-privileged state.
    pub async fn resolve_cookie_header(&self, header: Option<&str>) -> Option<Identity> {
        let token = self.unsign_cookie_header(header)?;
        let record = self.store.get(&token).await?;

        if record.is_expired(chrono::Utc::now()) {
            tracing::debug!(token = %record.token, "Session expired, resolving as anonymous");
            return None;
        }

        Some(record.identity)
    }

    /// Extract and verify the session token from a `Cookie` header without
    /// consulting the store. Used to mark the caller's own session in the
    /// admin listing.
    pub fn unsign_cookie_header(&self, header: Option<&str>) -> Option<String> {
        let signed = cookie::cookie_value(header?, SESSION_COOKIE_NAME)?;
        cookie::unsign(&signed, &self.secret)
    }

    /// Open a session for an already-authenticated identity.
    ///
    /// Called by the integrating auth layer after credential verification
    /// (which is outside this crate). Observer roles are notified so user
    /// lists refresh. Returns the stored record; pair it with
    /// [`SessionBridge::cookie_for`] to set the client's cookie.
    pub async fn open_session(&self, identity: Identity) -> SessionRecord {
        let record = SessionRecord {
            token: cookie::generate_token(),
            identity,
            expires_at: chrono::Utc::now() + self.ttl,
        };
        self.store.insert(record.clone()).await;

        tracing::info!(
            user_id = record.identity.id,
            username = %record.identity.username,
            "Session opened"
        );

        self.bus
            .broadcast(
                &self.observers,
                ServerMessage::Login(format!("{} logged in", record.identity.username)),
            )
            .await;
        self.bus
            .broadcast(&self.observers, ServerMessage::MembershipUpdate)
            .await;

        record
    }

    /// The signed `Cookie` header value for a session record.
    pub fn cookie_for(&self, record: &SessionRecord) -> String {
        cookie::header_value(&record.token, &self.secret)
    }

    /// Close one session (ordinary logout). No-op for unknown tokens.
    pub async fn close_session(&self, token: &str) {
        if let Some(record) = self.store.remove(token).await {
            tracing::info!(
                user_id = record.identity.id,
                username = %record.identity.username,
                "Session closed"
            );
            self.bus
                .broadcast(&self.observers, ServerMessage::MembershipUpdate)
                .await;
        }
    }

    /// Forcibly end every session of `target_id`.
    ///
    /// Destroys the server-side session records, unicasts a `forceLogout`
    /// to all of the target's connections (every tab), then proactively
    /// closes and evicts those connections rather than trusting the client
    /// to hang up. Returns the number of sessions destroyed.
    pub async fn force_logout(&self, target_id: DbId, message: &str) -> usize {
        let destroyed = self.store.remove_all_for(target_id).await;
        tracing::info!(user_id = target_id, destroyed, "Forcing logout");

        self.bus
            .unicast(target_id, ServerMessage::ForceLogout(message.to_string()))
            .await;

        for conn_id in self.registry.connection_ids_for(target_id).await {
            self.registry.send_close(&conn_id).await;
            crate::ws::evict(&self.registry, &self.locks, &conn_id).await;
        }

        destroyed
    }

    /// List active (non-expired) sessions for the admin screen.
    ///
    /// `current_token` is the caller's own verified session token, used to
    /// flag which row is theirs.
    pub async fn active_sessions(&self, current_token: Option<&str>) -> Vec<ActiveSession> {
        let now = chrono::Utc::now();
        let mut sessions: Vec<ActiveSession> = self
            .store
            .all()
            .await
            .into_iter()
            .filter(|record| !record.is_expired(now))
            .map(|record| ActiveSession {
                is_current_session: current_token == Some(record.token.as_str()),
                valid_until: record.expires_at,
                user_id: record.identity.id,
                username: record.identity.username,
                token: record.token,
            })
            .collect();
        sessions.sort_by(|a, b| a.valid_until.cmp(&b.valid_until));
        sessions
    }

    /// Session record behind a raw token, for the force-logout endpoint.
    pub async fn session_by_token(&self, token: &str) -> Option<SessionRecord> {
        self.store.get(token).await
    }
}
