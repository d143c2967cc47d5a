use std::sync::Arc;

use crate::config::ServerConfig;
use crate::ws::{SeatGateway, WsManager};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: cinebook_db::DbPool,
    /// Server configuration, including provider credentials.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection and room registry.
    pub ws_manager: Arc<WsManager>,
    /// Seat-lock operations exposed over the seats WebSocket.
    pub seat_gateway: Arc<SeatGateway>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<cinebook_events::EventBus>,
    /// HTTP client for payment provider calls, with the provider timeout applied.
    pub provider_http: reqwest::Client,
}
