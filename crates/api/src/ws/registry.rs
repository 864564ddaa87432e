use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use roster_core::identity::Identity;
use roster_core::roles::RoleSet;
use roster_core::types::{DbId, Timestamp};
use roster_core::wire::ServerMessage;
use roster_events::NotificationBus;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
struct WsConnection {
    /// Resolved identity, or `None` for an anonymous socket. Fixed at
    /// admission for the connection's lifetime.
    identity: Option<Identity>,
    /// Channel sender for outbound messages to this connection.
    sender: WsSender,
    /// Last time this connection acknowledged a liveness probe.
    last_pong: Timestamp,
    /// When this connection was established.
    #[allow(dead_code)]
    connected_at: Timestamp,
}

/// Ground truth of "who is actually still connected".
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Also the production [`NotificationBus`]:
/// role-filtered broadcast and per-identity unicast deliver straight to the
/// registered senders.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl ConnectionRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection with `last_pong = now`.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn admit(
        &self,
        conn_id: String,
        identity: Option<Identity>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let now = chrono::Utc::now();
        let conn = WsConnection {
            identity,
            sender: tx,
            last_pong: now,
            connected_at: now,
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Record a liveness acknowledgement for a connection.
    pub async fn record_pong(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.last_pong = chrono::Utc::now();
        }
    }

    /// Remove a connection by its ID.
    ///
    /// Returns the connection's identity if (and only if) it was that
    /// identity's last registered connection -- the signal that abandoned
    /// locks may now be released. Unknown ids and anonymous connections
    /// return `None`.
    pub async fn remove(&self, conn_id: &str) -> Option<Identity> {
        let mut conns = self.connections.write().await;
        let removed = conns.remove(conn_id)?;
        let identity = removed.identity?;

        let still_connected = conns
            .values()
            .any(|c| c.identity.as_ref().is_some_and(|i| i.id == identity.id));
        if still_connected {
            // Another tab of the same identity is still open; its locks
            // remain legitimately held.
            return None;
        }
        Some(identity)
    }

    /// Find all connection IDs associated with a given identity.
    pub async fn connection_ids_for(&self, identity_id: DbId) -> Vec<String> {
        self.connections
            .read()
            .await
            .iter()
            .filter_map(|(id, conn)| {
                conn.identity
                    .as_ref()
                    .is_some_and(|i| i.id == identity_id)
                    .then(|| id.clone())
            })
            .collect()
    }

    /// Send a Close frame to one connection (the transport task shuts the
    /// socket down when it drains the channel).
    pub async fn send_close(&self, conn_id: &str) {
        if let Some(conn) = self.connections.read().await.get(conn_id) {
            let _ = conn.sender.send(Message::Close(None));
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Partition connections for a heartbeat sweep at time `now`.
    ///
    /// Returns the ids of connections whose last pong is older than
    /// `timeout` (to be evicted) and cloned senders of the rest (to be
    /// pinged). Cloning the senders keeps the sweep's sends outside the
    /// registry lock.
    pub async fn sweep_partition(
        &self,
        now: Timestamp,
        timeout: chrono::Duration,
    ) -> (Vec<String>, Vec<WsSender>) {
        let conns = self.connections.read().await;
        let mut stale = Vec::new();
        let mut fresh = Vec::new();
        for (id, conn) in conns.iter() {
            if now - conn.last_pong > timeout {
                stale.push(id.clone());
            } else {
                fresh.push(conn.sender.clone());
            }
        }
        (stale, fresh)
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationBus for ConnectionRegistry {
    /// Deliver to every connection whose roles intersect `filter`.
    ///
    /// Senders are cloned out of the read guard first so a slow or
    /// half-closed socket cannot stall registry operations; closed channels
    /// are silently skipped (they are cleaned up by their receive loop).
    async fn broadcast(&self, filter: &RoleSet, msg: ServerMessage) {
        let frame = super::encode(&msg);
        let targets: Vec<WsSender> = {
            let conns = self.connections.read().await;
            conns
                .values()
                .filter(|c| {
                    c.identity
                        .as_ref()
                        .is_some_and(|i| i.roles.intersects(filter))
                })
                .map(|c| c.sender.clone())
                .collect()
        };

        for sender in targets {
            if sender.send(frame.clone()).is_err() {
                tracing::debug!("Broadcast skipped a closed connection channel");
            }
        }
    }

    /// Deliver to every connection belonging to one identity (multi-tab).
    async fn unicast(&self, identity_id: DbId, msg: ServerMessage) {
        let frame = super::encode(&msg);
        let targets: Vec<WsSender> = {
            let conns = self.connections.read().await;
            conns
                .values()
                .filter(|c| c.identity.as_ref().is_some_and(|i| i.id == identity_id))
                .map(|c| c.sender.clone())
                .collect()
        };

        for sender in targets {
            if sender.send(frame.clone()).is_err() {
                tracing::debug!(identity_id, "Unicast skipped a closed connection channel");
            }
        }
    }
}
