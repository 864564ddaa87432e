//! The notification bus seam.
//!
//! Two operations cover every delivery the system performs: role-filtered
//! broadcast and per-identity unicast. Delivery is best-effort and
//! fire-and-forget; nothing is queued, retried, or persisted. A connection
//! that is not registered at send time simply never sees the message, and
//! clients compensate by re-fetching authoritative state on reconnect.

use async_trait::async_trait;
use roster_core::roles::RoleSet;
use roster_core::types::DbId;
use roster_core::wire::ServerMessage;

/// Best-effort fan-out of [`ServerMessage`]s to connected clients.
///
/// Implementations must isolate per-recipient send failures: a stale or
/// half-closed connection never aborts delivery to the rest, and never
/// surfaces an error to the business operation that triggered the send.
#[async_trait]
pub trait NotificationBus: Send + Sync {
    /// Deliver `msg` to every connection whose role set intersects
    /// `filter`. Anonymous connections carry no roles and never match.
    async fn broadcast(&self, filter: &RoleSet, msg: ServerMessage);

    /// Deliver `msg` to every connection belonging to one identity
    /// (multi-tab fan-out of the same message).
    async fn unicast(&self, identity_id: DbId, msg: ServerMessage);
}

/// Bus that drops everything. Useful where notifications are irrelevant.
pub struct NullBus;

#[async_trait]
impl NotificationBus for NullBus {
    async fn broadcast(&self, _filter: &RoleSet, msg: ServerMessage) {
        tracing::trace!(?msg, "NullBus dropped broadcast");
    }

    async fn unicast(&self, _identity_id: DbId, msg: ServerMessage) {
        tracing::trace!(?msg, "NullBus dropped unicast");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    // The bus is always consumed as a trait object; make sure the trait
    // stays object-safe and a no-op implementation satisfies it.
    #[tokio::test]
    async fn null_bus_is_usable_as_trait_object() {
        let bus: Arc<dyn NotificationBus> = Arc::new(NullBus);

        bus.broadcast(&RoleSet::empty(), ServerMessage::Ping).await;
        bus.unicast(1, ServerMessage::MembershipUpdate).await;
    }
}
