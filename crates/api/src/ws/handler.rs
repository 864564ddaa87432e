use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use roster_core::identity::Identity;
use roster_core::wire::ClientMessage;

use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The session cookie is resolved to an identity *before* the upgrade
/// completes; any resolution failure (missing cookie, bad signature,
/// expired session) admits the connection as anonymous rather than
/// rejecting the handshake. Anonymous connections cannot hold locks and
/// receive no role-scoped broadcasts.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let cookie_header = headers.get(COOKIE).and_then(|v| v.to_str().ok());
    let identity = state.sessions.resolve_cookie_header(cookie_header).await;

    match &identity {
        Some(user) => tracing::info!(username = %user.username, "WebSocket connecting"),
        None => tracing::info!("WebSocket connecting (anonymous)"),
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with the registry.
///   2. Spawns a sender task that forwards messages from the registry channel.
///   3. Processes inbound messages on the current task.
///   4. Evicts on disconnect (close, error, or channel teardown).
async fn handle_socket(socket: WebSocket, state: AppState, identity: Option<Identity>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = state.registry.admit(conn_id.clone(), identity).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Pong) => {
                    state.registry.record_pong(&conn_id).await;
                }
                // Unknown or malformed frames are ignored, same as any
                // other client bug: the connection stays up until the
                // heartbeat decides otherwise.
                Err(_) => {
                    tracing::trace!(conn_id = %conn_id, "Ignoring unrecognized frame");
                }
            },
            // Protocol-level pongs count as liveness too.
            Ok(Message::Pong(_)) => {
                state.registry.record_pong(&conn_id).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Transport close and transport error both land here; the heartbeat
    // path uses the same routine, so cleanup happens exactly once.
    crate::ws::evict(&state.registry, &state.locks, &conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
