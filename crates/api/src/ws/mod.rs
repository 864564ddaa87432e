//! WebSocket infrastructure for real-time coordination.
//!
//! Provides the connection registry (which doubles as the production
//! notification bus), heartbeat monitoring, the HTTP upgrade handler, and
//! the single eviction routine shared by every disconnect path.

mod handler;
mod heartbeat;
pub mod registry;

pub use handler::ws_handler;
pub use heartbeat::HeartbeatMonitor;
pub use registry::ConnectionRegistry;

use axum::extract::ws::Message;
use roster_core::wire::ServerMessage;

use crate::locks::LockTable;

/// Serialize a wire message into a WebSocket text frame.
pub(crate) fn encode(msg: &ServerMessage) -> Message {
    // Serialization of the wire enum cannot fail; the expect documents that.
    let text = serde_json::to_string(msg).expect("wire message serializes to JSON");
    Message::Text(text.into())
}

/// Remove a connection and release its identity's locks if it was the last.
///
/// Heartbeat timeout, transport close, transport error, and forced logout
/// all converge here so cleanup happens exactly once: a second call for the
/// same connection id is a no-op because the registry no longer knows it.
pub async fn evict(registry: &ConnectionRegistry, locks: &LockTable, conn_id: &str) {
    let Some(identity) = registry.remove(conn_id).await else {
        return;
    };

    // Last connection for this identity is gone; abandoned locks must not
    // stay stuck forever.
    let released = locks.release_all_for(identity.id).await;
    if released > 0 {
        tracing::info!(
            user_id = identity.id,
            username = %identity.username,
            released,
            "Released locks after last connection closed"
        );
    }
}
