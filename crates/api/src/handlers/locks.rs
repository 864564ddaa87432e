//! Handlers for the advisory lock endpoints.
//!
//! Acquire is strict (401 for anonymous callers, 409 with the holder's name
//! on conflict); release is best-effort and always succeeds so UI teardown
//! paths can fire it blindly.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use roster_core::locking::LockKey;
use roster_core::types::{DbId, Timestamp};

use crate::error::{AppError, AppResult};
use crate::locks::AcquireOutcome;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// One lock in the debug listing, keyed by its `kind:id` encoding.
#[derive(Debug, Serialize)]
pub struct LockView {
    pub user_id: DbId,
    pub username: String,
    pub acquired_at: Timestamp,
}

/// POST /api/locks/{kind}/{id}
///
/// Attempt to acquire an exclusive advisory lock. Re-acquiring a lock the
/// caller already holds refreshes it and succeeds. Returns 409 with
/// `{ message, lockedBy }` when another identity holds the lock.
pub async fn acquire_lock(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let key = LockKey::new(kind, id)?;

    match state.locks.acquire(&key, &user).await {
        AcquireOutcome::Acquired | AcquireOutcome::Refreshed => {
            Ok(Json(json!({ "success": true })))
        }
        AcquireOutcome::Held { holder } => Err(AppError::LockHeld { holder }),
    }
}

/// DELETE /api/locks/{kind}/{id}
///
/// Best-effort release: succeeds whether or not the caller held the lock,
/// so clients can always unlock on dialog close without error handling.
pub async fn release_lock(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let key = LockKey::new(kind, id)?;

    state.locks.release(&key, &user).await;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/locks
///
/// Debug snapshot of the current lock table (admin only).
pub async fn list_locks(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let locks: BTreeMap<String, LockView> = state
        .locks
        .snapshot()
        .await
        .into_iter()
        .map(|(key, lock)| {
            (
                key.encode(),
                LockView {
                    user_id: lock.holder_id,
                    username: lock.holder_username,
                    acquired_at: lock.acquired_at,
                },
            )
        })
        .collect();

    Ok(Json(DataResponse { data: locks }))
}
