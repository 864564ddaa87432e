//! Session-cookie authentication extractors for Axum handlers.
//!
//! Handlers never touch raw credentials: the extractors resolve the signed
//! session cookie through the [`SessionBridge`](crate::session::SessionBridge)
//! and hand the handler an already-resolved identity (or its absence).

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;

use roster_core::error::CoreError;
use roster_core::identity::Identity;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated identity resolved from the session cookie.
///
/// Use as an extractor parameter in any handler that requires
/// authentication; requests without a valid session are rejected with 401.
///
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(identity) = MaybeUser::from_request_parts(parts, state).await?;
        identity.map(AuthUser).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Not logged in".into()))
        })
    }
}

/// Identity if the request carries a valid session, `None` otherwise.
///
/// For endpoints that tolerate anonymous callers (the WebSocket upgrade
/// resolves its cookie itself; HTTP endpoints use this).
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_header = parts.headers.get(COOKIE).and_then(|v| v.to_str().ok());
        let identity = state.sessions.resolve_cookie_header(cookie_header).await;
        Ok(MaybeUser(identity))
    }
}
