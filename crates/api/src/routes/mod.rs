pub mod health;
pub mod payments;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws/seats                                        seats WebSocket
///
/// /payments/{provider}/order                       create order (POST)
/// /payments/{provider}/callback                    provider callback (GET, POST)
/// /payments/{provider}/return                      browser return (GET)
/// /payments/status/{transaction_id}                payment status (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoints.
        .route("/ws/seats", get(ws::seats_ws_handler))
        // Payment orders, callbacks and status.
        .nest("/payments", payments::router())
}
