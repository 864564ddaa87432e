pub mod health;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                           WebSocket upgrade (anonymous allowed)
///
/// /locks                        debug lock listing (admin only)
/// /locks/{kind}/{id}            acquire (POST), release (DELETE)
///
/// /active-sessions              list active sessions (admin only)
/// /active-sessions/{token}      force logout (DELETE, admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/locks", get(handlers::locks::list_locks))
        .route(
            "/locks/{kind}/{id}",
            post(handlers::locks::acquire_lock).delete(handlers::locks::release_lock),
        )
        .route(
            "/active-sessions",
            get(handlers::active_sessions::list_active_sessions),
        )
        .route(
            "/active-sessions/{token}",
            delete(handlers::active_sessions::force_logout),
        )
}
