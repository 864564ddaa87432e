use roster_core::roles::{RoleSet, ROLE_ADMIN, ROLE_USER};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Secret used to sign session cookies.
    pub session_secret: String,
    /// Session lifetime in minutes (default: `480`).
    pub session_ttl_mins: i64,
    /// Interval between heartbeat pings in seconds (default: `10`).
    pub ping_interval_secs: u64,
    /// A connection that has not answered a ping within this many seconds
    /// is evicted (default: `30`). Must be at least twice the ping
    /// interval so one missed beat is tolerated.
    pub pong_timeout_secs: i64,
    /// Roles that receive lock and membership broadcasts
    /// (default: admin + regular user).
    pub observer_roles: RoleSet,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:4200` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `SESSION_SECRET`        | insecure dev secret     |
    /// | `SESSION_TTL_MINS`      | `480`                   |
    /// | `WS_PING_INTERVAL_SECS` | `10`                    |
    /// | `WS_PONG_TIMEOUT_SECS`  | `30`                    |
    /// | `OBSERVER_ROLES`        | `0,1`                   |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values and when `WS_PONG_TIMEOUT_SECS` is less
    /// than twice `WS_PING_INTERVAL_SECS` -- misconfiguration should fail
    /// at startup, not surface as spurious evictions later.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:4200".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
            tracing::warn!("SESSION_SECRET not set, using insecure development default");
            "insecure-dev-secret".into()
        });

        let session_ttl_mins: i64 = std::env::var("SESSION_TTL_MINS")
            .unwrap_or_else(|_| "480".into())
            .parse()
            .expect("SESSION_TTL_MINS must be a valid i64");

        let ping_interval_secs: u64 = std::env::var("WS_PING_INTERVAL_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("WS_PING_INTERVAL_SECS must be a valid u64");

        let pong_timeout_secs: i64 = std::env::var("WS_PONG_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("WS_PONG_TIMEOUT_SECS must be a valid i64");

        assert!(
            pong_timeout_secs >= 2 * ping_interval_secs as i64,
            "WS_PONG_TIMEOUT_SECS ({pong_timeout_secs}) must be at least twice \
             WS_PING_INTERVAL_SECS ({ping_interval_secs}) to tolerate one missed beat"
        );

        let observer_roles: RoleSet = std::env::var("OBSERVER_ROLES")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        let observer_roles = if observer_roles.is_empty() {
            [ROLE_ADMIN, ROLE_USER].into_iter().collect()
        } else {
            observer_roles
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            session_secret,
            session_ttl_mins,
            ping_interval_secs,
            pong_timeout_secs,
            observer_roles,
        }
    }
}
