//! VNPay adapter. Orders are signed redirect URLs, so creation makes no
//! upstream call.

use chrono::Utc;
use cinebook_core::payment::vnpay::{self as wire, Ack, PaymentRequest};
use cinebook_core::payment::{transaction_ref, PaymentProvider, VerifyError};
use cinebook_core::types::Amount;
use cinebook_db::models::booking::Booking;
use cinebook_db::models::payment::SettlementOutcome;
use serde_json::json;

use super::config::{PaymentsConfig, VnPayConfig};
use super::orders::{disabled, ProviderOrder};
use super::redirect::{PaymentReturn, ReturnStatus};
use super::{query_map, query_payload, settlement};
use crate::error::AppResult;
use crate::state::AppState;

const PROVIDER: PaymentProvider = PaymentProvider::VnPay;

pub(crate) fn config(payments: &PaymentsConfig) -> AppResult<&VnPayConfig> {
    payments.vnpay.as_ref().ok_or_else(|| disabled(PROVIDER))
}

/// Build the signed payment URL for a booking.
pub fn create_order(
    config: &VnPayConfig,
    booking: &Booking,
    amount: Amount,
    description: &str,
    client_ip: &str,
) -> ProviderOrder {
    let txn_ref = transaction_ref(PROVIDER, booking.id);
    let request = PaymentRequest {
        tmn_code: &config.tmn_code,
        txn_ref: &txn_ref,
        amount,
        order_info: description,
        return_url: &config.return_url,
        ip_addr: client_ip,
        created_at: Utc::now(),
    };
    let pay_url = wire::payment_url(&config.payment_url, &config.hash_secret, &request);

    ProviderOrder {
        raw_response: Some(json!({ "params": request.params() })),
        transaction_id: txn_ref,
        pay_url,
    }
}

/// Handle an IPN query string.
pub async fn handle_ipn(state: &AppState, query: &str) -> Ack {
    let Ok(config) = config(&state.config.payments) else {
        tracing::warn!(provider = %PROVIDER, "Callback for disabled provider");
        return Ack::unknown_error();
    };

    let params = query_map(query);
    let verified = match wire::verify(&config.hash_secret, &params) {
        Ok(verified) => verified,
        Err(err) => {
            settlement::log_rejected(PROVIDER, &err);
            return match err {
                VerifyError::SignatureMismatch { .. } => Ack::invalid_checksum(),
                VerifyError::Malformed(_) => Ack::order_not_found(),
            };
        }
    };

    let Some(amount) = verified.amount else {
        tracing::warn!(
            provider = %PROVIDER,
            transaction_id = %verified.transaction_id,
            "IPN without a valid amount"
        );
        return Ack::invalid_amount();
    };

    let raw = query_payload(&params);
    match settlement::apply(state, PROVIDER, &verified, Some(amount), raw).await {
        Ok(SettlementOutcome::Confirmed { .. } | SettlementOutcome::Declined { .. }) => {
            Ack::confirmed()
        }
        Ok(SettlementOutcome::AlreadyProcessed { .. }) => Ack::already_confirmed(),
        Ok(SettlementOutcome::AmountMismatch { .. }) => Ack::invalid_amount(),
        Ok(SettlementOutcome::NotFound) => Ack::order_not_found(),
        Err(e) => {
            tracing::error!(provider = %PROVIDER, error = %e, "Failed to settle payment");
            Ack::unknown_error()
        }
    }
}

/// Handle the browser return URL. Carries the same signed fields as the IPN.
pub async fn handle_return(state: &AppState, query: &str) -> PaymentReturn {
    let params = query_map(query);
    let txn_ref = params.get("vnp_TxnRef").cloned().unwrap_or_default();
    let reported = params
        .get("vnp_Amount")
        .and_then(|v| v.parse::<Amount>().ok())
        .map(|raw| raw / wire::AMOUNT_MULTIPLIER);

    let Ok(config) = config(&state.config.payments) else {
        return PaymentReturn::new(txn_ref, ReturnStatus::Error, reported);
    };

    let verified = match wire::verify(&config.hash_secret, &params) {
        Ok(verified) => verified,
        Err(err) => {
            settlement::log_rejected(PROVIDER, &err);
            return PaymentReturn::new(txn_ref, ReturnStatus::Invalid, reported);
        }
    };

    let Some(amount) = verified.amount else {
        return PaymentReturn::new(verified.transaction_id, ReturnStatus::Invalid, None);
    };

    let raw = query_payload(&params);
    let status = match settlement::apply(state, PROVIDER, &verified, Some(amount), raw).await {
        Ok(outcome) => ReturnStatus::from_outcome(&outcome),
        Err(e) => {
            tracing::error!(provider = %PROVIDER, error = %e, "Failed to settle payment");
            ReturnStatus::Error
        }
    };

    PaymentReturn::new(verified.transaction_id, status, Some(amount))
}
