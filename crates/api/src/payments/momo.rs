//! MoMo adapter.

use cinebook_core::payment::momo::{
    self as wire, Ack, CreateRequest, CreateResponse, ResultNotification,
};
use cinebook_core::payment::{transaction_ref, PaymentProvider, VerifyError};
use cinebook_core::types::Amount;
use cinebook_db::models::booking::Booking;
use cinebook_db::models::payment::SettlementOutcome;

use super::config::{MoMoConfig, PaymentsConfig};
use super::orders::{disabled, ProviderOrder};
use super::redirect::{PaymentReturn, ReturnStatus};
use super::{post_for_json, settlement, ProviderError};
use crate::error::AppResult;
use crate::state::AppState;

const PROVIDER: PaymentProvider = PaymentProvider::MoMo;

pub(crate) fn config(payments: &PaymentsConfig) -> AppResult<&MoMoConfig> {
    payments.momo.as_ref().ok_or_else(|| disabled(PROVIDER))
}

/// Create a `captureWallet` order.
pub async fn create_order(
    http: &reqwest::Client,
    config: &MoMoConfig,
    booking: &Booking,
    amount: Amount,
    description: &str,
) -> Result<ProviderOrder, ProviderError> {
    let order_id = transaction_ref(PROVIDER, booking.id);
    let request = CreateRequest {
        partner_code: config.partner_code.clone(),
        request_id: order_id.clone(),
        amount,
        order_id,
        order_info: description.to_string(),
        redirect_url: config.redirect_url.clone(),
        ipn_url: config.ipn_url.clone(),
        request_type: wire::REQUEST_TYPE.into(),
        extra_data: String::new(),
        lang: wire::LANG.into(),
        signature: String::new(),
    }
    .signed(&config.access_key, &config.secret_key);

    let raw = post_for_json(PROVIDER, http.post(&config.endpoint).json(&request)).await?;
    let response: CreateResponse =
        serde_json::from_value(raw.clone()).map_err(ProviderError::decode(PROVIDER))?;

    if !response.is_success() {
        return Err(ProviderError::Rejected {
            provider: PROVIDER,
            code: response.result_code.to_string(),
            message: response.message,
        });
    }

    Ok(ProviderOrder {
        transaction_id: request.order_id,
        pay_url: response.pay_url,
        raw_response: Some(raw),
    })
}

/// Handle an IPN JSON body.
pub async fn handle_ipn(state: &AppState, body: &[u8]) -> Ack {
    let notification: ResultNotification = match serde_json::from_slice(body) {
        Ok(notification) => notification,
        Err(e) => {
            tracing::warn!(provider = %PROVIDER, error = %e, "Unreadable IPN body");
            return Ack::failure(&ResultNotification::default(), "invalid notification body");
        }
    };

    let Ok(config) = config(&state.config.payments) else {
        tracing::warn!(provider = %PROVIDER, "Callback for disabled provider");
        return Ack::failure(&notification, "provider not configured");
    };

    let verified = match wire::verify_notification(
        &config.access_key,
        &config.secret_key,
        &notification,
    ) {
        Ok(verified) => verified,
        Err(err) => {
            settlement::log_rejected(PROVIDER, &err);
            return match err {
                VerifyError::SignatureMismatch { .. } => Ack::invalid_signature(&notification),
                VerifyError::Malformed(_) => Ack::failure(&notification, "invalid notification"),
            };
        }
    };

    let raw = serde_json::to_value(&notification).unwrap_or_default();
    match settlement::apply(state, PROVIDER, &verified, None, raw).await {
        Ok(SettlementOutcome::NotFound) => Ack::failure(&notification, "order not found"),
        Ok(_) => Ack::success(&notification),
        Err(e) => {
            tracing::error!(provider = %PROVIDER, error = %e, "Failed to settle payment");
            Ack::failure(&notification, "internal error")
        }
    }
}

/// Handle the browser redirect. MoMo signs the same fields as the IPN.
pub async fn handle_return(state: &AppState, query: &str) -> PaymentReturn {
    let notification: ResultNotification = serde_urlencoded::from_str(query).unwrap_or_default();
    let amount = Some(notification.amount).filter(|a| *a > 0);

    let Ok(config) = config(&state.config.payments) else {
        return PaymentReturn::new(notification.order_id, ReturnStatus::Error, amount);
    };

    let verified = match wire::verify_notification(
        &config.access_key,
        &config.secret_key,
        &notification,
    ) {
        Ok(verified) => verified,
        Err(err) => {
            settlement::log_rejected(PROVIDER, &err);
            return PaymentReturn::new(notification.order_id, ReturnStatus::Invalid, amount);
        }
    };

    let raw = serde_json::to_value(&notification).unwrap_or_default();
    let status = match settlement::apply(state, PROVIDER, &verified, None, raw).await {
        Ok(outcome) => ReturnStatus::from_outcome(&outcome),
        Err(e) => {
            tracing::error!(provider = %PROVIDER, error = %e, "Failed to settle payment");
            ReturnStatus::Error
        }
    };

    PaymentReturn::new(verified.transaction_id, status, amount)
}
