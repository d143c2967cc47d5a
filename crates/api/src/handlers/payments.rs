//! Handlers for the `/payments` resource.
//!
//! Order creation and the status lookup return [`AppResult`]. Callback
//! endpoints always answer 200 with the provider's acknowledgement body;
//! only an unknown provider segment is rejected with an error.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use cinebook_core::error::CoreError;
use cinebook_core::payment::PaymentProvider;
use cinebook_core::types::{Amount, DbId, Timestamp};
use cinebook_db::models::payment::PaymentStatusView;
use cinebook_db::models::status::{BookingPaymentStatus, BookingStatus, PaymentStatus};
use cinebook_db::repositories::PaymentRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::payments::orders::{self, CreateOrderRequest, CreatedOrder};
use crate::payments::{momo, vnpay, zalopay};
use crate::state::AppState;

/// Address reported to VNPay when the client address is unknown.
const FALLBACK_CLIENT_IP: &str = "127.0.0.1";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_provider(segment: &str) -> AppResult<PaymentProvider> {
    Ok(segment.parse::<PaymentProvider>()?)
}

/// First hop of `X-Forwarded-For`, or the loopback address.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(FALLBACK_CLIENT_IP)
        .to_string()
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// POST /api/v1/payments/{provider}/order
pub async fn create_order(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Json(input): Json<CreateOrderRequest>,
) -> AppResult<Json<CreatedOrder>> {
    let provider = parse_provider(&provider)?;
    let order = orders::create_order(&state, provider, input, &client_ip(&headers)).await?;
    Ok(Json(order))
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// GET|POST /api/v1/payments/{provider}/callback
///
/// ZaloPay and MoMo post JSON bodies. VNPay sends its IPN as a query string,
/// or as a form body when posted without one.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> AppResult<Response> {
    let provider = parse_provider(&provider)?;
    tracing::debug!(%provider, "Payment callback received");

    let response = match provider {
        PaymentProvider::ZaloPay => {
            Json(zalopay::handle_callback(&state, &body).await).into_response()
        }
        PaymentProvider::VnPay => {
            let query = match query.filter(|q| !q.is_empty()) {
                Some(query) => query,
                None => String::from_utf8_lossy(&body).into_owned(),
            };
            Json(vnpay::handle_ipn(&state, &query).await).into_response()
        }
        PaymentProvider::MoMo => Json(momo::handle_ipn(&state, &body).await).into_response(),
    };
    Ok(response)
}

/// GET /api/v1/payments/{provider}/return
///
/// Settles synchronously, then hands the browser back to the app.
pub async fn payment_return(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    RawQuery(query): RawQuery,
) -> AppResult<Html<String>> {
    let provider = parse_provider(&provider)?;
    let query = query.unwrap_or_default();

    let result = match provider {
        PaymentProvider::ZaloPay => zalopay::handle_return(&state, &query).await,
        PaymentProvider::VnPay => vnpay::handle_return(&state, &query).await,
        PaymentProvider::MoMo => momo::handle_return(&state, &query).await,
    };

    tracing::info!(
        %provider,
        transaction_id = %result.transaction_id,
        status = result.status.as_str(),
        "Payment return handled"
    );
    Ok(result.render(&state.config.deep_link_scheme))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub transaction_id: String,
    pub status: &'static str,
    pub booking_id: DbId,
    pub booking_code: String,
    pub booking_status: &'static str,
    pub payment_status: &'static str,
    pub amount: Amount,
    pub updated_at: Timestamp,
}

impl From<PaymentStatusView> for PaymentStatusResponse {
    fn from(view: PaymentStatusView) -> Self {
        Self {
            transaction_id: view.transaction_id,
            status: PaymentStatus::name_of(view.status_id),
            booking_id: view.booking_id,
            booking_code: view.booking_code,
            booking_status: BookingStatus::name_of(view.booking_status_id),
            payment_status: BookingPaymentStatus::name_of(view.booking_payment_status_id),
            amount: view.amount,
            updated_at: view.updated_at,
        }
    }
}

/// GET /api/v1/payments/status/{transaction_id}
pub async fn payment_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> AppResult<Json<PaymentStatusResponse>> {
    let view = PaymentRepo::find_status_view(&state.pool, &transaction_id)
        .await?
        .ok_or(CoreError::NotFoundByKey {
            entity: "Payment",
            key: transaction_id,
        })?;

    Ok(Json(view.into()))
}
