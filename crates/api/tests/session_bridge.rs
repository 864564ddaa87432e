//! Tests for `SessionBridge`: cookie resolution, session lifecycle
//! notifications, and forced logout.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::ws::Message;

use common::{
    admin_identity, build_test_app, decode_frame, drain, observers, user_identity, RecordingBus,
    Sent,
};
use roster_api::locks::LockTable;
use roster_api::session::{MemorySessionStore, SessionBridge, SessionRecord, SessionStore};
use roster_api::ws::ConnectionRegistry;
use roster_core::locking::LockKey;
use roster_core::wire::ServerMessage;

/// Bridge wired to a recording bus (for notification assertions) but a real
/// registry and lock table (for connection-closing assertions).
fn bridge_with_recording_bus() -> (
    Arc<SessionBridge>,
    Arc<RecordingBus>,
    Arc<MemorySessionStore>,
) {
    let registry = Arc::new(ConnectionRegistry::new());
    let bus = Arc::new(RecordingBus::new());
    let locks = Arc::new(LockTable::new(bus.clone(), observers()));
    let store = Arc::new(MemorySessionStore::new());
    let bridge = Arc::new(SessionBridge::new(
        store.clone(),
        bus.clone(),
        registry,
        locks,
        "test-secret",
        60,
        observers(),
    ));
    (bridge, bus, store)
}

// ---------------------------------------------------------------------------
// Test: a freshly opened session resolves back to its identity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_cookie_resolves_to_identity() {
    let (bridge, _bus, _store) = bridge_with_recording_bus();

    let record = bridge.open_session(user_identity(2, "user1")).await;
    let cookie = bridge.cookie_for(&record);

    let resolved = bridge.resolve_cookie_header(Some(&cookie)).await;
    assert_eq!(resolved.map(|i| i.username), Some("user1".to_string()));
}

// ---------------------------------------------------------------------------
// Test: every resolution failure degrades to anonymous
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolution_failures_are_anonymous_not_errors() {
    let (bridge, _bus, store) = bridge_with_recording_bus();

    // No header at all.
    assert_eq!(bridge.resolve_cookie_header(None).await, None);

    // Header without our cookie.
    assert_eq!(
        bridge.resolve_cookie_header(Some("theme=dark")).await,
        None
    );

    // Tampered signature.
    let record = bridge.open_session(user_identity(2, "user1")).await;
    let cookie = bridge.cookie_for(&record);
    let tampered = cookie.replace(&record.token, "forged-token-value-abcdef");
    assert_eq!(bridge.resolve_cookie_header(Some(&tampered)).await, None);

    // Well-signed but unknown token (session destroyed underneath).
    store.remove(&record.token).await;
    assert_eq!(bridge.resolve_cookie_header(Some(&cookie)).await, None);
}

// ---------------------------------------------------------------------------
// Test: an expired session resolves to anonymous
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_session_resolves_to_anonymous() {
    let (bridge, _bus, store) = bridge_with_recording_bus();

    let record = SessionRecord {
        token: "expired-token".into(),
        identity: user_identity(2, "user1"),
        expires_at: chrono::Utc::now() - chrono::Duration::minutes(1),
    };
    store.insert(record.clone()).await;
    let cookie = bridge.cookie_for(&record);

    assert_eq!(bridge.resolve_cookie_header(Some(&cookie)).await, None);
}

// ---------------------------------------------------------------------------
// Test: opening a session notifies observer roles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_session_notifies_observers() {
    let (bridge, bus, _store) = bridge_with_recording_bus();

    bridge.open_session(user_identity(2, "user1")).await;

    let sent = bus.take().await;
    assert_eq!(sent.len(), 2);
    assert_matches!(
        &sent[0],
        Sent::Broadcast { msg: ServerMessage::Login(text), .. } if text.contains("user1")
    );
    assert_matches!(
        &sent[1],
        Sent::Broadcast {
            msg: ServerMessage::MembershipUpdate,
            ..
        }
    );
}

// ---------------------------------------------------------------------------
// Test: closing a session notifies once; unknown tokens are silent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn close_session_notifies_only_when_a_session_existed() {
    let (bridge, bus, _store) = bridge_with_recording_bus();

    let record = bridge.open_session(user_identity(2, "user1")).await;
    bus.take().await;

    bridge.close_session(&record.token).await;
    let sent = bus.take().await;
    assert_eq!(sent.len(), 1);
    assert_matches!(
        &sent[0],
        Sent::Broadcast {
            msg: ServerMessage::MembershipUpdate,
            ..
        }
    );

    bridge.close_session("no-such-token").await;
    assert!(bus.take().await.is_empty());
}

// ---------------------------------------------------------------------------
// Test: forced logout hits every tab of the target and nobody else
// ---------------------------------------------------------------------------

#[tokio::test]
async fn force_logout_reaches_both_tabs_and_only_them() {
    // Full wiring: registry as the real bus so delivery is observable on
    // actual connection channels.
    let app = build_test_app();
    let target = user_identity(7, "user7");

    let mut tab1 = app.registry.admit("tab-1".into(), Some(target.clone())).await;
    let mut tab2 = app.registry.admit("tab-2".into(), Some(target.clone())).await;
    let mut other = app
        .registry
        .admit("other".into(), Some(user_identity(8, "user8")))
        .await;
    let mut admin = app
        .registry
        .admit("admin-conn".into(), Some(admin_identity()))
        .await;

    // Two sessions (two browsers), one lock held by the target.
    app.sessions.open_session(target.clone()).await;
    app.sessions.open_session(target.clone()).await;
    app.locks
        .acquire(&LockKey::new("person", "42").unwrap(), &target)
        .await;
    drain(&mut tab1);
    drain(&mut tab2);
    drain(&mut other);
    drain(&mut admin);

    let destroyed = app.sessions.force_logout(target.id, "Session ended.").await;
    assert_eq!(destroyed, 2);

    // Both tabs got the forceLogout, then a Close frame.
    for rx in [&mut tab1, &mut tab2] {
        let msgs = drain(rx);
        assert_eq!(
            decode_frame(&msgs[0]),
            ServerMessage::ForceLogout("Session ended.".into())
        );
        assert!(msgs.iter().any(|m| matches!(m, Message::Close(None))));
    }

    // The target's connections are gone and its lock was released.
    assert_eq!(app.registry.connection_count().await, 2);
    assert!(app.locks.is_empty().await);

    // Nobody else received a forceLogout.
    for rx in [&mut other, &mut admin] {
        let msgs = drain(rx);
        assert!(msgs
            .iter()
            .all(|m| !matches!(decode_frame(m), ServerMessage::ForceLogout(_))));
    }
}

// ---------------------------------------------------------------------------
// Test: the admin listing hides expired sessions and flags the caller's own
// ---------------------------------------------------------------------------

#[tokio::test]
async fn active_sessions_listing_filters_and_flags() {
    let (bridge, _bus, store) = bridge_with_recording_bus();

    let mine = bridge.open_session(admin_identity()).await;
    let theirs = bridge.open_session(user_identity(2, "user1")).await;
    store
        .insert(SessionRecord {
            token: "long-gone".into(),
            identity: user_identity(3, "user2"),
            expires_at: chrono::Utc::now() - chrono::Duration::minutes(5),
        })
        .await;

    let listing = bridge.active_sessions(Some(&mine.token)).await;

    assert_eq!(listing.len(), 2);
    assert!(listing.iter().all(|s| s.token != "long-gone"));

    let my_row = listing.iter().find(|s| s.token == mine.token).unwrap();
    assert!(my_row.is_current_session);
    let their_row = listing.iter().find(|s| s.token == theirs.token).unwrap();
    assert!(!their_row.is_current_session);
    assert_eq!(their_row.username, "user1");
}
