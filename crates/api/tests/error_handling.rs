//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests call `IntoResponse` directly on `AppError` values; no HTTP
//! server or database is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use cinebook_api::error::AppError;
use cinebook_api::payments::ProviderError;
use cinebook_core::error::CoreError;
use cinebook_core::payment::PaymentProvider;
use cinebook_core::seat_lock::SeatLockError;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Booking",
        id: 100,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Booking with id 100 not found");
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFoundByKey maps to 404 and names the key
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_by_key_returns_404() {
    let err = AppError::Core(CoreError::NotFoundByKey {
        entity: "Payment",
        key: "vnpay-100-abc".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Payment 'vnpay-100-abc' not found");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Validation maps to 400 with VALIDATION_ERROR code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("amount must be positive".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "amount must be positive");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Conflict maps to 409
// ---------------------------------------------------------------------------

#[tokio::test]
async fn core_conflict_returns_409() {
    let err = AppError::Core(CoreError::Conflict("Booking BK100 is cancelled".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Booking BK100 is cancelled");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Internal maps to 500 and hides the detail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn core_internal_error_is_sanitized() {
    let err = AppError::Core(CoreError::Internal("lock store unreachable".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: AppError::BadRequest maps to 400 with BAD_REQUEST code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("Booking BK100 is already paid".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "Booking BK100 is already paid");
}

// ---------------------------------------------------------------------------
// Test: a seat lock conflict surfaces as 409
// ---------------------------------------------------------------------------

#[tokio::test]
async fn seat_conflict_returns_409() {
    let core: CoreError = SeatLockError::Conflict {
        showtime_id: 42,
        seat_id: 7,
    }
    .into();

    let (status, json) = error_to_response(AppError::Core(core)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert!(json["error"].as_str().unwrap().contains("already locked"));
}

// ---------------------------------------------------------------------------
// Test: a provider rejection maps to 502 with PROVIDER_ERROR code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_rejection_returns_502() {
    let err = AppError::Provider(ProviderError::Rejected {
        provider: PaymentProvider::ZaloPay,
        code: "-2".into(),
        message: "Invalid mac".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "PROVIDER_ERROR");
    assert_eq!(json["error"], "zalopay rejected the order (-2): Invalid mac");
}

// ---------------------------------------------------------------------------
// Test: AppError::InternalError maps to 500 and sanitizes the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("smtp password rejected".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: sqlx RowNotFound maps to 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: unknown provider segment is a validation error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_provider_returns_400() {
    let core = "paypal".parse::<PaymentProvider>().unwrap_err();

    let (status, json) = error_to_response(AppError::Core(core)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Unknown payment provider 'paypal'");
}
