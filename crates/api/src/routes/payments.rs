//! Route definitions for the `/payments` resource.
//!
//! Callback and return endpoints are called by the providers and by the
//! customer's browser; they carry no authentication and trust only the
//! provider signature.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST   /{provider}/order             -> create_order
/// GET    /{provider}/callback          -> callback (VNPay IPN)
/// POST   /{provider}/callback          -> callback
/// GET    /{provider}/return            -> payment_return
/// GET    /status/{transaction_id}      -> payment_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{provider}/order", post(payments::create_order))
        .route(
            "/{provider}/callback",
            get(payments::callback).post(payments::callback),
        )
        .route("/{provider}/return", get(payments::payment_return))
        .route("/status/{transaction_id}", get(payments::payment_status))
}
