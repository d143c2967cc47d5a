//! Applying verified provider results.

use cinebook_core::payment::{PaymentProvider, VerifiedResult, VerifyError};
use cinebook_core::types::Amount;
use cinebook_db::models::payment::{ProviderResult, SettlementOutcome};
use cinebook_db::repositories::PaymentRepo;
use cinebook_events::BookingConfirmation;

use crate::state::AppState;

/// Apply a verified result to its payment and, on a fresh transition to
/// `completed`, publish `booking.confirmed`.
///
/// `verify_amount` is compared against the stored amount before anything is
/// written. Re-deliveries come back as
/// [`SettlementOutcome::AlreadyProcessed`] and publish nothing.
pub async fn apply(
    state: &AppState,
    provider: PaymentProvider,
    verified: &VerifiedResult,
    verify_amount: Option<Amount>,
    raw_payload: serde_json::Value,
) -> Result<SettlementOutcome, sqlx::Error> {
    let result = ProviderResult {
        succeeded: verified.succeeded,
        return_code: verified.return_code.clone(),
        message: verified.message.clone(),
        verify_amount,
        raw_payload,
    };

    let outcome = PaymentRepo::settle(&state.pool, &verified.transaction_id, &result).await?;

    match &outcome {
        SettlementOutcome::Confirmed { payment, booking } => {
            tracing::info!(
                %provider,
                transaction_id = %payment.transaction_id,
                booking_id = booking.id,
                "Payment completed, booking confirmed"
            );
            state.event_bus.publish(
                BookingConfirmation {
                    booking_id: booking.id,
                    booking_code: booking.booking_code.clone(),
                    contact_email: booking.contact_email.clone(),
                    amount: payment.amount,
                    transaction_id: payment.transaction_id.clone(),
                    provider: payment.provider.clone(),
                }
                .into_event(),
            );
        }
        SettlementOutcome::AlreadyProcessed { payment } => {
            tracing::info!(
                %provider,
                transaction_id = %payment.transaction_id,
                status_id = payment.status_id,
                "Callback for already processed payment ignored"
            );
        }
        SettlementOutcome::Declined { payment } => {
            tracing::info!(
                %provider,
                transaction_id = %payment.transaction_id,
                return_code = %verified.return_code,
                "Provider reported payment failure"
            );
        }
        SettlementOutcome::AmountMismatch { expected, received } => {
            tracing::warn!(
                %provider,
                transaction_id = %verified.transaction_id,
                expected,
                received,
                "Callback amount does not match payment"
            );
        }
        SettlementOutcome::NotFound => {
            tracing::warn!(
                %provider,
                transaction_id = %verified.transaction_id,
                "Callback for unknown transaction"
            );
        }
    }

    Ok(outcome)
}

/// Log a rejected callback. Signature mismatches carry both digests.
pub(crate) fn log_rejected(provider: PaymentProvider, err: &VerifyError) {
    match err {
        VerifyError::SignatureMismatch { expected, received } => {
            tracing::warn!(%provider, %expected, %received, "Callback signature mismatch");
        }
        VerifyError::Malformed(reason) => {
            tracing::warn!(%provider, %reason, "Malformed callback payload");
        }
    }
}
