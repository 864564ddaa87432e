use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use roster_core::types::Timestamp;
use roster_core::wire::ServerMessage;

use crate::locks::LockTable;
use crate::ws::registry::ConnectionRegistry;

/// Periodic liveness sweep over every registered connection.
///
/// Each tick, connections that have not answered a ping within the timeout
/// are closed and evicted (releasing their identity's locks when it was the
/// last connection); everyone else gets the next `ping` frame. The timeout
/// is at least twice the interval (enforced at config load), so one missed
/// beat never evicts.
pub struct HeartbeatMonitor {
    registry: Arc<ConnectionRegistry>,
    locks: Arc<LockTable>,
    ping_interval: Duration,
    pong_timeout: chrono::Duration,
}

impl HeartbeatMonitor {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        locks: Arc<LockTable>,
        ping_interval_secs: u64,
        pong_timeout_secs: i64,
    ) -> Self {
        Self {
            registry,
            locks,
            ping_interval: Duration::from_secs(ping_interval_secs),
            pong_timeout: chrono::Duration::seconds(pong_timeout_secs),
        }
    }

    /// Spawn the background sweep task.
    ///
    /// Runs until `cancel` is triggered (during graceful shutdown). The
    /// returned `JoinHandle` can be awaited to confirm the task stopped.
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.ping_interval);
            // The first tick fires immediately; skip it so freshly admitted
            // connections get a full interval before their first ping.
            interval.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        tracing::info!("Heartbeat monitor stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        self.sweep_once(chrono::Utc::now()).await;
                    }
                }
            }
        })
    }

    /// Run one sweep as of time `now`.
    ///
    /// Separated from the loop so tests can drive sweeps without a clock.
    pub async fn sweep_once(&self, now: Timestamp) {
        let (stale, fresh) = self
            .registry
            .sweep_partition(now, self.pong_timeout)
            .await;

        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "Evicting unresponsive connections");
        }

        for conn_id in &stale {
            // Close the transport, then run the shared eviction routine.
            // A connection whose close event already evicted it is gone
            // from the registry by now, and both calls no-op.
            self.registry.send_close(conn_id).await;
            super::evict(&self.registry, &self.locks, conn_id).await;
        }

        let ping = super::encode(&ServerMessage::Ping);
        tracing::debug!(count = fresh.len(), "WebSocket heartbeat ping");
        for sender in fresh {
            let _ = sender.send(ping.clone());
        }
    }
}
