//! WebSocket wire protocol.
//!
//! Frames are JSON objects with a `"type"` discriminator and an optional
//! `"data"` payload, e.g. `{"type":"lockUpdate","data":{"action":"unlock",
//! "kind":"person","id":"42"}}`. Liveness probes are ordinary `ping`/`pong`
//! messages in the same framing, not protocol-level control frames, so any
//! JSON-speaking client can answer them.

use serde::{Deserialize, Serialize};

use crate::locking::LockKey;
use crate::types::DbId;

/// Server-to-client messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Liveness probe. Clients answer with [`ClientMessage::Pong`].
    Ping,

    /// A lock changed state. Broadcast to observer roles.
    LockUpdate(LockUpdate),

    /// The set of active sessions changed; clients re-fetch, no payload.
    MembershipUpdate,

    /// The receiving identity's session was destroyed by an administrator.
    /// Carries a human-readable reason; the client clears local state.
    ForceLogout(String),

    /// Informational notice about a login, for observer roles.
    Login(String),
}

/// Client-to-server messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Liveness acknowledgement for a server `ping`.
    Pong,
}

/// What happened to a lock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LockAction {
    Lock,
    Unlock,
    /// Every lock held by `user_id` was released at once (disconnect path).
    UnlockAll,
}

/// Payload of [`ServerMessage::LockUpdate`].
///
/// `kind`/`id` identify the resource for single-lock events; `unlock_all`
/// carries only the affected user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockUpdate {
    pub action: LockAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(
        rename = "userId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<DbId>,
}

impl LockUpdate {
    /// A lock was acquired by `username`.
    pub fn locked(key: &LockKey, username: impl Into<String>) -> Self {
        Self {
            action: LockAction::Lock,
            kind: Some(key.kind().to_string()),
            id: Some(key.id().to_string()),
            username: Some(username.into()),
            user_id: None,
        }
    }

    /// A lock was released.
    pub fn unlocked(key: &LockKey) -> Self {
        Self {
            action: LockAction::Unlock,
            kind: Some(key.kind().to_string()),
            id: Some(key.id().to_string()),
            username: None,
            user_id: None,
        }
    }

    /// Every lock held by `user_id` was released (eviction path).
    pub fn unlock_all(user_id: DbId) -> Self {
        Self {
            action: LockAction::UnlockAll,
            kind: None,
            id: None,
            username: None,
            user_id: Some(user_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
