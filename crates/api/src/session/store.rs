//! The session-store seam.
//!
//! Session creation and credential verification belong to the integrating
//! application's auth layer; this coordination core only needs to look
//! sessions up, enumerate them, and destroy them. [`SessionStore`] is that
//! contract, with [`MemorySessionStore`] as the in-process implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use roster_core::identity::Identity;
use roster_core::types::{DbId, Timestamp};

/// One stored session: an opaque token bound to a resolved identity.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token: String,
    pub identity: Identity,
    pub expires_at: Timestamp,
}

impl SessionRecord {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

/// Storage contract for session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, record: SessionRecord);

    /// Look up a session by token. Expired records are returned as-is;
    /// expiry policy belongs to the caller.
    async fn get(&self, token: &str) -> Option<SessionRecord>;

    /// Remove one session. Returns the removed record, if any.
    async fn remove(&self, token: &str) -> Option<SessionRecord>;

    /// Remove every session belonging to one identity. Returns how many
    /// were removed.
    async fn remove_all_for(&self, identity_id: DbId) -> usize;

    /// All stored sessions (admin listing).
    async fn all(&self) -> Vec<SessionRecord>;
}

/// In-memory session store.
///
/// Sessions vanish on process restart together with the rest of the
/// coordination state; clients re-authenticate and reconnect.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: SessionRecord) {
        self.sessions
            .write()
            .await
            .insert(record.token.clone(), record);
    }

    async fn get(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(token).cloned()
    }

    async fn remove(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.write().await.remove(token)
    }

    async fn remove_all_for(&self, identity_id: DbId) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.identity.id != identity_id);
        before - sessions.len()
    }

    async fn all(&self) -> Vec<SessionRecord> {
        self.sessions.read().await.values().cloned().collect()
    }
}
