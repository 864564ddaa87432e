use std::sync::Arc;

use crate::config::ServerConfig;
use crate::locks::LockTable;
use crate::session::SessionBridge;
use crate::ws::ConnectionRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// The coordination singletons (registry, lock table, session bridge) are
/// constructed once at startup and injected here; this is cheaply cloneable
/// (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection registry (also the notification bus).
    pub registry: Arc<ConnectionRegistry>,
    /// Process-wide advisory lock table.
    pub locks: Arc<LockTable>,
    /// Credential-to-identity bridge and session lifecycle.
    pub sessions: Arc<SessionBridge>,
}
