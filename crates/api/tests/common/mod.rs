#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use cinebook_api::config::ServerConfig;
use cinebook_api::payments::config::{MoMoConfig, PaymentsConfig, VnPayConfig, ZaloPayConfig};
use cinebook_api::router::build_app_router;
use cinebook_api::state::AppState;
use cinebook_api::ws::{SeatGateway, WsManager};
use cinebook_core::clock::SystemClock;
use cinebook_core::seat_lock::SeatLockManager;
use cinebook_db::models::booking::{Booking, CreateBooking};
use cinebook_db::repositories::BookingRepo;
use cinebook_db::PgLockStore;
use cinebook_events::EventBus;

pub const ZALOPAY_KEY1: &str = "zp-key1";
pub const ZALOPAY_KEY2: &str = "zp-key2";
pub const VNPAY_SECRET: &str = "vnp-secret";
pub const VNPAY_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";
pub const MOMO_ACCESS_KEY: &str = "momo-access";
pub const MOMO_SECRET_KEY: &str = "momo-secret";

/// Provider settings pointing ZaloPay and MoMo at `upstream` (a mock
/// server base URL).
pub fn test_payments(upstream: &str) -> PaymentsConfig {
    PaymentsConfig {
        provider_timeout_secs: 5,
        zalopay: Some(ZaloPayConfig {
            app_id: "2553".to_string(),
            key1: ZALOPAY_KEY1.to_string(),
            key2: ZALOPAY_KEY2.to_string(),
            endpoint: format!("{upstream}/v2/create"),
            callback_url: "https://api.cinebook.test/api/v1/payments/zalopay/callback".to_string(),
            redirect_url: "https://api.cinebook.test/api/v1/payments/zalopay/return".to_string(),
        }),
        vnpay: Some(VnPayConfig {
            tmn_code: "CINE0001".to_string(),
            hash_secret: VNPAY_SECRET.to_string(),
            payment_url: VNPAY_URL.to_string(),
            return_url: "https://api.cinebook.test/api/v1/payments/vnpay/return".to_string(),
        }),
        momo: Some(MoMoConfig {
            partner_code: "MOMOCINE".to_string(),
            access_key: MOMO_ACCESS_KEY.to_string(),
            secret_key: MOMO_SECRET_KEY.to_string(),
            endpoint: format!("{upstream}/v2/gateway/api/create"),
            ipn_url: "https://api.cinebook.test/api/v1/payments/momo/callback".to_string(),
            redirect_url: "https://api.cinebook.test/api/v1/payments/momo/return".to_string(),
        }),
    }
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout. Upstream provider calls go to a closed
/// local port unless a test swaps in a mock server.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        seat_lock_ttl_secs: 600,
        sweep_interval_secs: 60,
        sweep_broadcast: false,
        deep_link_scheme: "cinebook".to_string(),
        payments: test_payments("http://127.0.0.1:9"),
    }
}

/// Application state over `pool` with Postgres-backed seat locks.
pub fn test_state(pool: PgPool, config: ServerConfig) -> AppState {
    let ws_manager = Arc::new(WsManager::new());
    let seat_locks = Arc::new(SeatLockManager::new(
        Arc::new(PgLockStore::new(pool.clone())),
        Arc::new(SystemClock),
        config.seat_lock_ttl(),
    ));
    let provider_http = cinebook_api::payments::provider_client(&config.payments).unwrap();

    AppState {
        pool,
        config: Arc::new(config),
        ws_manager: Arc::clone(&ws_manager),
        seat_gateway: Arc::new(SeatGateway::new(seat_locks, ws_manager)),
        event_bus: Arc::new(EventBus::default()),
        provider_http,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Goes through [`build_app_router`] so integration tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery)
/// that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(test_state(pool, test_config()))
}

pub fn build_test_app_with(state: AppState) -> Router {
    let config = state.config.as_ref().clone();
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn seed_booking(pool: &PgPool, code: &str, total_amount: i64) -> Booking {
    BookingRepo::create(
        pool,
        &CreateBooking {
            booking_code: code.to_string(),
            showtime_id: 42,
            contact_email: Some("guest@example.com".to_string()),
            total_amount,
        },
    )
    .await
    .unwrap()
}
