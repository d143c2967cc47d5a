//! Application router and its middleware stack.
//!
//! [`build_app_router`] is shared by `main.rs` and `tests/common/mod.rs`.
//! Two kinds of client reach this service: the booking app (browser or
//! WebView, cross-origin, no credentials) and the payment providers
//! (server-to-server callbacks, no CORS involvement).

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

const REQUEST_ID: &str = "x-request-id";

/// Largest request body accepted. Order requests and provider callbacks are
/// small JSON or form documents.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Headroom left after the provider call before the request itself times
/// out, so a slow provider surfaces as 502 rather than 408.
const PROVIDER_CALL_HEADROOM_SECS: u64 = 5;

/// Build the full application [`Router`].
///
/// Layers, outermost first: CORS, request id, tracing, request-id
/// propagation, timeout, panic recovery, body limit.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout(config),
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// The per-request timeout: the configured value, raised when needed so an
/// order request always outlives its provider call.
pub fn request_timeout(config: &ServerConfig) -> Duration {
    let floor = config.payments.provider_timeout_secs + PROVIDER_CALL_HEADROOM_SECS;
    Duration::from_secs(config.request_timeout_secs.max(floor))
}

/// CORS for the booking app. The API is unauthenticated, so no credentials
/// or authorization header are allowed; the request id is exposed so the app
/// can report it.
///
/// Panics at startup on an invalid origin.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(REQUEST_ID)])
        .max_age(Duration::from_secs(3600))
}
