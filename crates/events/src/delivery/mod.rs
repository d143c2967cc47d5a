//! Outbound delivery channels for booking confirmations.

pub mod email;

use async_trait::async_trait;

use crate::confirmation::BookingConfirmation;
use email::EmailError;

/// A channel that can deliver a booking confirmation to its contact.
#[async_trait]
pub trait ConfirmationSender: Send + Sync {
    async fn send(&self, confirmation: &BookingConfirmation) -> Result<(), EmailError>;
}

/// Fallback used when SMTP is not configured: records the confirmation in
/// the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogDelivery;

#[async_trait]
impl ConfirmationSender for LogDelivery {
    async fn send(&self, confirmation: &BookingConfirmation) -> Result<(), EmailError> {
        tracing::info!(
            booking_id = confirmation.booking_id,
            booking_code = %confirmation.booking_code,
            to = confirmation.contact_email.as_deref().unwrap_or("-"),
            transaction_id = %confirmation.transaction_id,
            "Booking confirmation (SMTP not configured, logged only)"
        );
        Ok(())
    }
}
