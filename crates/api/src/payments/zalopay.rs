//! ZaloPay adapter.

use chrono::Utc;
use cinebook_core::payment::zalopay::{
    self as wire, Ack, CallbackBody, OrderRequest, OrderResponse, RedirectParams,
};
use cinebook_core::payment::{PaymentProvider, VerifyError};
use cinebook_core::types::Amount;
use cinebook_db::models::booking::Booking;
use cinebook_db::models::payment::SettlementOutcome;
use serde_json::json;

use super::config::{PaymentsConfig, ZaloPayConfig};
use super::orders::{disabled, ProviderOrder};
use super::redirect::{PaymentReturn, ReturnStatus};
use super::{post_for_json, query_map, query_payload, settlement, ProviderError};
use crate::error::AppResult;
use crate::state::AppState;

const PROVIDER: PaymentProvider = PaymentProvider::ZaloPay;

pub(crate) fn config(payments: &PaymentsConfig) -> AppResult<&ZaloPayConfig> {
    payments.zalopay.as_ref().ok_or_else(|| disabled(PROVIDER))
}

/// Create an order through `POST /v2/create`.
pub async fn create_order(
    http: &reqwest::Client,
    config: &ZaloPayConfig,
    booking: &Booking,
    amount: Amount,
    description: &str,
) -> Result<ProviderOrder, ProviderError> {
    let now = Utc::now();
    let request = OrderRequest {
        app_id: config.app_id.clone(),
        app_trans_id: wire::app_trans_id(now, booking.id),
        app_user: booking.booking_code.clone(),
        app_time: now.timestamp_millis(),
        amount,
        item: "[]".into(),
        embed_data: json!({ "redirecturl": config.redirect_url }).to_string(),
        description: description.to_string(),
        bank_code: String::new(),
        callback_url: config.callback_url.clone(),
        mac: String::new(),
    }
    .signed(&config.key1);

    let raw = post_for_json(PROVIDER, http.post(&config.endpoint).form(&request)).await?;
    let response: OrderResponse =
        serde_json::from_value(raw.clone()).map_err(ProviderError::decode(PROVIDER))?;

    if !response.is_success() {
        return Err(ProviderError::Rejected {
            provider: PROVIDER,
            code: response.return_code.to_string(),
            message: response
                .sub_return_message
                .unwrap_or(response.return_message),
        });
    }

    Ok(ProviderOrder {
        transaction_id: request.app_trans_id,
        pay_url: response.order_url,
        raw_response: Some(raw),
    })
}

/// Handle a server-to-server callback body.
pub async fn handle_callback(state: &AppState, body: &[u8]) -> Ack {
    let Ok(config) = config(&state.config.payments) else {
        tracing::warn!(provider = %PROVIDER, "Callback for disabled provider");
        return Ack::failure("provider not configured");
    };

    let callback: CallbackBody = match serde_json::from_slice(body) {
        Ok(callback) => callback,
        Err(e) => {
            tracing::warn!(provider = %PROVIDER, error = %e, "Unreadable callback body");
            return Ack::failure("invalid callback body");
        }
    };

    let verified = match wire::verify_callback(&config.key2, &callback) {
        Ok(verified) => verified,
        Err(err) => {
            settlement::log_rejected(PROVIDER, &err);
            return match err {
                VerifyError::SignatureMismatch { .. } => Ack::invalid_mac(),
                VerifyError::Malformed(_) => Ack::failure("invalid callback data"),
            };
        }
    };

    let raw = serde_json::from_str(&callback.data)
        .unwrap_or_else(|_| serde_json::Value::String(callback.data.clone()));

    match settlement::apply(state, PROVIDER, &verified, None, raw).await {
        Ok(SettlementOutcome::NotFound) => Ack::failure("transaction not found"),
        Ok(_) => Ack::success(),
        Err(e) => {
            tracing::error!(provider = %PROVIDER, error = %e, "Failed to settle payment");
            Ack::failure("internal error")
        }
    }
}

/// Handle the browser redirect after checkout.
pub async fn handle_return(state: &AppState, query: &str) -> PaymentReturn {
    let params = query_map(query);
    let redirect: RedirectParams = serde_urlencoded::from_str(query).unwrap_or_default();
    let amount = redirect.amount.parse().ok();

    let Ok(config) = config(&state.config.payments) else {
        return PaymentReturn::new(redirect.apptransid, ReturnStatus::Error, amount);
    };

    let verified = match wire::verify_redirect(&config.key2, &redirect) {
        Ok(verified) => verified,
        Err(err) => {
            settlement::log_rejected(PROVIDER, &err);
            return PaymentReturn::new(redirect.apptransid, ReturnStatus::Invalid, amount);
        }
    };

    let raw = query_payload(&params);
    let status = match settlement::apply(state, PROVIDER, &verified, None, raw).await {
        Ok(outcome) => ReturnStatus::from_outcome(&outcome),
        Err(e) => {
            tracing::error!(provider = %PROVIDER, error = %e, "Failed to settle payment");
            ReturnStatus::Error
        }
    };

    PaymentReturn::new(verified.transaction_id, status, verified.amount)
}
