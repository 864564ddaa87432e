use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use roster_core::identity::Identity;
use roster_core::locking::{Lock, LockKey};
use roster_core::roles::RoleSet;
use roster_core::types::DbId;
use roster_core::wire::{LockUpdate, ServerMessage};
use roster_events::NotificationBus;

/// Result of an acquire attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquireOutcome {
    /// The key was free; the caller now holds it.
    Acquired,
    /// The caller already held the key; the timestamp was re-stamped.
    Refreshed,
    /// Another identity holds the key. Carries the holder's username for
    /// the conflict message shown to the caller.
    Held { holder: String },
}

/// In-memory map from resource key to current holder.
///
/// Process-wide singleton with lifecycle = process lifetime; a restart
/// silently clears all locks (documented failure mode). All mutations are
/// serialized behind one mutex because acquire/release/eviction race across
/// independent connections. Notification delivery always happens after the
/// guard is dropped, with targets resolved by the bus, so a stalled client
/// socket can never stall lock operations.
///
/// Locks have no expiry of their own: a holder that stays connected keeps
/// its locks until it releases them or disconnects.
pub struct LockTable {
    locks: Mutex<HashMap<LockKey, Lock>>,
    bus: Arc<dyn NotificationBus>,
    /// Roles that are told about lock state changes.
    observers: RoleSet,
}

impl LockTable {
    pub fn new(bus: Arc<dyn NotificationBus>, observers: RoleSet) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            bus,
            observers,
        }
    }

    /// Attempt to acquire `key` for `who`.
    ///
    /// First acquirer wins; a concurrent loser gets [`AcquireOutcome::Held`]
    /// and the table is unchanged. Re-acquiring a key the caller already
    /// holds re-stamps the timestamp and succeeds quietly. A fresh acquire
    /// notifies observer roles.
    pub async fn acquire(&self, key: &LockKey, who: &Identity) -> AcquireOutcome {
        let outcome = {
            let mut locks = self.locks.lock().await;
            match locks.get_mut(key) {
                Some(lock) if lock.holder_id == who.id => {
                    lock.acquired_at = chrono::Utc::now();
                    AcquireOutcome::Refreshed
                }
                Some(lock) => AcquireOutcome::Held {
                    holder: lock.holder_username.clone(),
                },
                None => {
                    locks.insert(
                        key.clone(),
                        Lock {
                            holder_id: who.id,
                            holder_username: who.username.clone(),
                            acquired_at: chrono::Utc::now(),
                        },
                    );
                    AcquireOutcome::Acquired
                }
            }
        };

        if outcome == AcquireOutcome::Acquired {
            tracing::info!(key = %key, username = %who.username, "Lock acquired");
            self.bus
                .broadcast(
                    &self.observers,
                    ServerMessage::LockUpdate(LockUpdate::locked(key, &who.username)),
                )
                .await;
        }

        outcome
    }

    /// Release `key` if `who` holds it.
    ///
    /// Best-effort semantics for UI teardown paths: a release by a
    /// non-holder, or of a free key, is a silent no-op and emits nothing.
    /// Returns `true` only when a lock was actually removed.
    pub async fn release(&self, key: &LockKey, who: &Identity) -> bool {
        let released = {
            let mut locks = self.locks.lock().await;
            match locks.get(key) {
                Some(lock) if lock.holder_id == who.id => {
                    locks.remove(key);
                    true
                }
                _ => false,
            }
        };

        if released {
            tracing::info!(key = %key, username = %who.username, "Lock released");
            self.bus
                .broadcast(
                    &self.observers,
                    ServerMessage::LockUpdate(LockUpdate::unlocked(key)),
                )
                .await;
        }

        released
    }

    /// Release every lock held by `identity_id` (eviction path).
    ///
    /// Emits a single aggregate `unlock_all` notification when at least one
    /// lock was removed; clients re-fetch rather than tracking per key.
    /// Returns the number of locks released.
    pub async fn release_all_for(&self, identity_id: DbId) -> usize {
        let released = {
            let mut locks = self.locks.lock().await;
            let before = locks.len();
            locks.retain(|_, lock| lock.holder_id != identity_id);
            before - locks.len()
        };

        if released > 0 {
            tracing::info!(user_id = identity_id, released, "Released all locks for identity");
            self.bus
                .broadcast(
                    &self.observers,
                    ServerMessage::LockUpdate(LockUpdate::unlock_all(identity_id)),
                )
                .await;
        }

        released
    }

    /// Consistent snapshot of the current table for the debug listing.
    pub async fn snapshot(&self) -> Vec<(LockKey, Lock)> {
        self.locks
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of currently held locks.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
