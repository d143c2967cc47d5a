//! Payment rows and the settlement DTOs used by provider callbacks.

use cinebook_core::payment::PaymentProvider;
use cinebook_core::types::{Amount, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::booking::Booking;
use super::status::{PaymentStatus, StatusId};

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub transaction_id: String,
    pub booking_id: DbId,
    pub provider: String,
    pub amount: Amount,
    pub status_id: StatusId,
    pub provider_return_code: Option<String>,
    pub provider_message: Option<String>,
    pub raw_payload: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    pub fn is_pending(&self) -> bool {
        self.status_id == PaymentStatus::Pending.id()
    }
}

/// Input for recording a freshly created provider order.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub transaction_id: String,
    pub booking_id: DbId,
    pub provider: PaymentProvider,
    pub amount: Amount,
    /// Provider order-creation response, kept for audit.
    pub raw_payload: Option<serde_json::Value>,
}

/// A verified provider result to apply to a payment.
#[derive(Debug, Clone)]
pub struct ProviderResult {
    pub succeeded: bool,
    pub return_code: String,
    pub message: String,
    /// When set, must equal the stored amount or nothing is written.
    pub verify_amount: Option<Amount>,
    /// Callback payload exactly as received.
    pub raw_payload: serde_json::Value,
}

/// What applying a provider result did.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// Payment moved to `completed`; booking is now paid and confirmed.
    Confirmed { payment: Payment, booking: Booking },
    /// Payment was already past `pending`; nothing was written.
    AlreadyProcessed { payment: Payment },
    /// Provider reported failure; code recorded, payment stays `pending`.
    Declined { payment: Payment },
    /// Reported amount differs from the stored one; nothing was written.
    AmountMismatch { expected: Amount, received: Amount },
    /// No payment with this transaction id.
    NotFound,
}

/// Payment joined with its booking, for the status endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentStatusView {
    pub transaction_id: String,
    pub status_id: StatusId,
    pub booking_id: DbId,
    pub booking_code: String,
    pub booking_status_id: StatusId,
    pub booking_payment_status_id: StatusId,
    pub amount: Amount,
    pub updated_at: Timestamp,
}
