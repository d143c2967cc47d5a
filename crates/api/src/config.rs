use crate::payments::config::PaymentsConfig;

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
    /// Seat lock lifetime in seconds (default: `600`).
    pub seat_lock_ttl_secs: i64,
    /// Interval between expired-lock sweeps in seconds (default: `60`).
    pub sweep_interval_secs: u64,
    /// Whether swept locks are announced to their showtime rooms.
    pub sweep_broadcast: bool,
    /// URL scheme of the mobile app, used by payment return pages.
    pub deep_link_scheme: String,
    /// Payment provider credentials and endpoints.
    pub payments: PaymentsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `SEAT_LOCK_TTL_SECS`       | `600`                   |
    /// | `SEAT_SWEEP_INTERVAL_SECS` | `60`                    |
    /// | `SEAT_SWEEP_BROADCAST`     | `false`                 |
    /// | `APP_DEEP_LINK_SCHEME`     | `cinebook`              |
    ///
    /// Provider variables are documented on [`PaymentsConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let seat_lock_ttl_secs: i64 = std::env::var("SEAT_LOCK_TTL_SECS")
            .unwrap_or_else(|_| cinebook_core::seat_lock::DEFAULT_LOCK_TTL_SECS.to_string())
            .parse()
            .expect("SEAT_LOCK_TTL_SECS must be a valid i64");
        assert!(seat_lock_ttl_secs > 0, "SEAT_LOCK_TTL_SECS must be positive");

        let sweep_interval_secs = parse_sweep_interval(
            &std::env::var("SEAT_SWEEP_INTERVAL_SECS").unwrap_or_else(|_| "60".into()),
        );

        let sweep_broadcast: bool = std::env::var("SEAT_SWEEP_BROADCAST")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("SEAT_SWEEP_BROADCAST must be true or false");

        let deep_link_scheme =
            std::env::var("APP_DEEP_LINK_SCHEME").unwrap_or_else(|_| "cinebook".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            seat_lock_ttl_secs,
            sweep_interval_secs,
            sweep_broadcast,
            deep_link_scheme,
            payments: PaymentsConfig::from_env(),
        }
    }

    pub fn seat_lock_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.seat_lock_ttl_secs)
    }
}

/// `tokio::time::interval` panics on a zero period, so zero is rejected here.
fn parse_sweep_interval(raw: &str) -> u64 {
    let secs: u64 = raw
        .parse()
        .expect("SEAT_SWEEP_INTERVAL_SECS must be a valid u64");
    assert!(secs > 0, "SEAT_SWEEP_INTERVAL_SECS must be positive");
    secs
}
