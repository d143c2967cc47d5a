use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cinebook_core::clock::SystemClock;
use cinebook_core::seat_lock::SeatLockManager;
use cinebook_db::PgLockStore;
use cinebook_events::{
    ConfirmationDispatcher, ConfirmationSender, EmailConfig, EmailDelivery, EventBus, LogDelivery,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinebook_api::config::ServerConfig;
use cinebook_api::router::build_app_router;
use cinebook_api::state::AppState;
use cinebook_api::{background, payments, ws};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinebook_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = cinebook_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    cinebook_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    cinebook_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Seat locks ---
    let seat_locks = Arc::new(SeatLockManager::new(
        Arc::new(PgLockStore::new(pool.clone())),
        Arc::new(SystemClock),
        config.seat_lock_ttl(),
    ));
    let seat_gateway = Arc::new(ws::SeatGateway::new(seat_locks, Arc::clone(&ws_manager)));
    tracing::info!(ttl_secs = config.seat_lock_ttl_secs, "Seat lock manager created");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    tracing::info!("Event bus created");

    // Spawn the confirmation dispatcher (emails booking confirmations).
    let sender: Arc<dyn ConfirmationSender> = match EmailConfig::from_env() {
        Some(email) => {
            tracing::info!(host = %email.smtp_host, "SMTP delivery enabled");
            Arc::new(EmailDelivery::new(email))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, booking confirmations will only be logged");
            Arc::new(LogDelivery)
        }
    };
    let dispatcher_handle =
        tokio::spawn(ConfirmationDispatcher::new(sender).run(event_bus.subscribe()));

    // --- Seat lock sweeper ---
    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(background::seat_lock_sweeper::run(
        Arc::clone(&seat_gateway),
        Duration::from_secs(config.sweep_interval_secs),
        config.sweep_broadcast,
        sweeper_cancel.clone(),
    ));

    // --- Payment providers ---
    let provider_http = payments::provider_client(&config.payments)
        .expect("Failed to build payment provider HTTP client");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        seat_gateway,
        event_bus: Arc::clone(&event_bus),
        provider_http,
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

    // Stop the sweeper.
    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("Seat lock sweeper stopped");

    // Drop the event bus sender to close the broadcast channel.
    // This signals the confirmation dispatcher to shut down.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    tracing::info!("Confirmation dispatcher shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
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
