use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_api::config::ServerConfig;
use roster_api::locks::LockTable;
use roster_api::router::build_app_router;
use roster_api::session::{MemorySessionStore, SessionBridge};
use roster_api::state::AppState;
use roster_api::ws::{ConnectionRegistry, HeartbeatMonitor};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Coordination singletons ---
    // The registry doubles as the notification bus; the lock table and the
    // session bridge deliver through it.
    let registry = Arc::new(ConnectionRegistry::new());
    let locks = Arc::new(LockTable::new(
        registry.clone(),
        config.observer_roles.clone(),
    ));
    let session_store = Arc::new(MemorySessionStore::new());
    let sessions = Arc::new(SessionBridge::new(
        session_store,
        registry.clone(),
        Arc::clone(&registry),
        Arc::clone(&locks),
        config.session_secret.clone(),
        config.session_ttl_mins,
        config.observer_roles.clone(),
    ));

    // --- Heartbeat ---
    let heartbeat_cancel = tokio_util::sync::CancellationToken::new();
    let heartbeat_handle = HeartbeatMonitor::new(
        Arc::clone(&registry),
        Arc::clone(&locks),
        config.ping_interval_secs,
        config.pong_timeout_secs,
    )
    .spawn(heartbeat_cancel.clone());
    tracing::info!(
        interval_secs = config.ping_interval_secs,
        timeout_secs = config.pong_timeout_secs,
        "Heartbeat monitor started"
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        locks: Arc::clone(&locks),
        sessions: Arc::clone(&sessions),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    heartbeat_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), heartbeat_handle).await;
    tracing::info!("Heartbeat monitor stopped");

    let ws_count = registry.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    registry.shutdown_all().await;

    // In-memory coordination state (locks, sessions, registrations) dies
    // with the process; clients must reconnect and re-acquire.
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
