//! Handlers for the admin session screen: list active sessions and
//! forcibly end another user's session.

use axum::extract::{Path, State};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Message delivered to a user whose session an administrator destroyed.
const FORCED_LOGOUT_MESSAGE: &str = "Administrator has closed your session.";

/// GET /api/active-sessions
///
/// List all active sessions (admin only). The caller's own session is
/// flagged so the UI can stop them from kicking themselves by accident.
pub async fn list_active_sessions(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let cookie_header = headers.get(COOKIE).and_then(|v| v.to_str().ok());
    let current_token = state.sessions.unsign_cookie_header(cookie_header);

    let sessions = state
        .sessions
        .active_sessions(current_token.as_deref())
        .await;
    Ok(Json(DataResponse { data: sessions }))
}

/// DELETE /api/active-sessions/{token}
///
/// Destroy the targeted session and force-log-out its owner (admin only).
/// Every session of the owning identity is destroyed, the owner's
/// connections receive a `forceLogout` message, and the server closes
/// those connections itself. An unknown token is answered with success:
/// the session the admin wanted gone is gone.
pub async fn force_logout(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    if let Some(record) = state.sessions.session_by_token(&token).await {
        tracing::info!(
            admin = %admin.username,
            target = %record.identity.username,
            "Admin is ending a user session"
        );
        state
            .sessions
            .force_logout(record.identity.id, FORCED_LOGOUT_MESSAGE)
            .await;
    }

    Ok(Json(json!({ "message": "User logged out successfully" })))
}
