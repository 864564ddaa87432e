//! Tests for the shared eviction routine: the transport-close and
//! heartbeat-timeout paths both funnel into `ws::evict`, which must release
//! abandoned locks exactly once and tell the remaining observers.

mod common;

use std::sync::Arc;

use common::{admin_identity, decode_frame, drain, observers, user_identity};
use roster_api::locks::LockTable;
use roster_api::ws::{self, ConnectionRegistry};
use roster_core::locking::LockKey;
use roster_core::wire::{LockAction, ServerMessage};

fn wired() -> (Arc<ConnectionRegistry>, Arc<LockTable>) {
    let registry = Arc::new(ConnectionRegistry::new());
    let locks = Arc::new(LockTable::new(registry.clone(), observers()));
    (registry, locks)
}

// ---------------------------------------------------------------------------
// Test: evicting the last connection releases locks and notifies observers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn evicting_last_connection_releases_locks() {
    let (registry, locks) = wired();
    let user1 = user_identity(2, "user1");

    let mut admin_rx = registry
        .admit("admin-conn".into(), Some(admin_identity()))
        .await;
    let _user_rx = registry.admit("user-conn".into(), Some(user1.clone())).await;

    locks.acquire(&LockKey::new("task", "7").unwrap(), &user1).await;
    drain(&mut admin_rx);

    ws::evict(&registry, &locks, "user-conn").await;

    assert!(locks.is_empty().await);
    assert_eq!(registry.connection_count().await, 1);

    // The still-registered observer connection saw the bulk release.
    let got = drain(&mut admin_rx);
    assert_eq!(got.len(), 1);
    match decode_frame(&got[0]) {
        ServerMessage::LockUpdate(update) => {
            assert_eq!(update.action, LockAction::UnlockAll);
            assert_eq!(update.user_id, Some(user1.id));
        }
        other => panic!("expected a lockUpdate, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: locks survive as long as another tab of the holder remains
// ---------------------------------------------------------------------------

#[tokio::test]
async fn locks_survive_while_another_tab_is_open() {
    let (registry, locks) = wired();
    let user1 = user_identity(2, "user1");

    let _tab1 = registry.admit("tab-1".into(), Some(user1.clone())).await;
    let _tab2 = registry.admit("tab-2".into(), Some(user1.clone())).await;

    let key = LockKey::new("person", "42").unwrap();
    locks.acquire(&key, &user1).await;

    // Closing one tab must not strip the lock held through the other.
    ws::evict(&registry, &locks, "tab-1").await;
    assert_eq!(locks.len().await, 1);

    ws::evict(&registry, &locks, "tab-2").await;
    assert!(locks.is_empty().await);
}

// ---------------------------------------------------------------------------
// Test: double eviction of the same connection is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn double_eviction_is_idempotent() {
    let (registry, locks) = wired();
    let user1 = user_identity(2, "user1");

    let mut admin_rx = registry
        .admit("admin-conn".into(), Some(admin_identity()))
        .await;
    let _user_rx = registry.admit("user-conn".into(), Some(user1.clone())).await;

    locks.acquire(&LockKey::new("task", "7").unwrap(), &user1).await;
    drain(&mut admin_rx);

    // Transport close and a heartbeat sweep can both report the same
    // connection; the second call must not produce a second notification.
    ws::evict(&registry, &locks, "user-conn").await;
    ws::evict(&registry, &locks, "user-conn").await;

    let got = drain(&mut admin_rx);
    assert_eq!(got.len(), 1, "exactly one unlock_all expected");
}

// ---------------------------------------------------------------------------
// Test: evicting a lock-free identity notifies nobody
// ---------------------------------------------------------------------------

#[tokio::test]
async fn eviction_without_locks_is_silent() {
    let (registry, locks) = wired();

    let mut admin_rx = registry
        .admit("admin-conn".into(), Some(admin_identity()))
        .await;
    let _user_rx = registry
        .admit("user-conn".into(), Some(user_identity(2, "user1")))
        .await;

    ws::evict(&registry, &locks, "user-conn").await;

    assert!(drain(&mut admin_rx).is_empty());
}
