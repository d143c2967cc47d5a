//! Order creation shared by all providers.

use cinebook_core::error::CoreError;
use cinebook_core::payment::PaymentProvider;
use cinebook_core::types::{Amount, DbId};
use cinebook_db::models::payment::CreatePayment;
use cinebook_db::repositories::{BookingRepo, PaymentRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::payments::{momo, vnpay, zalopay};
use crate::state::AppState;

/// Request body for `POST /payments/{provider}/order`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub booking_id: DbId,
    /// Defaults to the booking total.
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response body for `POST /payments/{provider}/order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_ref: String,
    pub pay_url: String,
    pub amount: Amount,
}

/// What a provider adapter hands back once the order exists upstream.
#[derive(Debug, Clone)]
pub struct ProviderOrder {
    pub transaction_id: String,
    pub pay_url: String,
    pub raw_response: Option<serde_json::Value>,
}

/// Create a provider order for a booking and record it as a pending payment.
///
/// Nothing is written until the provider has accepted the order; the payment
/// insert and the booking's `unpaid` mark share one transaction.
pub async fn create_order(
    state: &AppState,
    provider: PaymentProvider,
    input: CreateOrderRequest,
    client_ip: &str,
) -> AppResult<CreatedOrder> {
    let booking = BookingRepo::find_by_id(&state.pool, input.booking_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Booking",
            id: input.booking_id,
        })?;

    if booking.is_paid() {
        return Err(AppError::BadRequest(format!(
            "Booking {} is already paid",
            booking.booking_code
        )));
    }

    let amount = input.amount.unwrap_or(booking.total_amount);
    if amount <= 0 {
        return Err(CoreError::Validation("Amount must be positive".into()).into());
    }

    let description = input
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Cinebook - Payment for booking {}", booking.booking_code));

    let payments = &state.config.payments;
    let order = match provider {
        PaymentProvider::ZaloPay => {
            let config = zalopay::config(payments)?;
            zalopay::create_order(&state.provider_http, config, &booking, amount, &description)
                .await?
        }
        PaymentProvider::VnPay => {
            let config = vnpay::config(payments)?;
            vnpay::create_order(config, &booking, amount, &description, client_ip)
        }
        PaymentProvider::MoMo => {
            let config = momo::config(payments)?;
            momo::create_order(&state.provider_http, config, &booking, amount, &description)
                .await?
        }
    };

    let payment = PaymentRepo::create_pending(
        &state.pool,
        &CreatePayment {
            transaction_id: order.transaction_id,
            booking_id: booking.id,
            provider,
            amount,
            raw_payload: order.raw_response,
        },
    )
    .await?
    .ok_or_else(|| {
        AppError::BadRequest(format!("Booking {} is no longer payable", booking.booking_code))
    })?;

    tracing::info!(
        %provider,
        booking_id = booking.id,
        transaction_id = %payment.transaction_id,
        amount,
        "Payment order created"
    );

    Ok(CreatedOrder {
        order_ref: payment.transaction_id,
        pay_url: order.pay_url,
        amount,
    })
}

/// Reject a provider whose credentials are not configured.
pub(crate) fn disabled(provider: PaymentProvider) -> AppError {
    AppError::BadRequest(format!("Payment provider {provider} is not configured"))
}
