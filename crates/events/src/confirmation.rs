//! Booking confirmation dispatch.
//!
//! [`ConfirmationDispatcher`] subscribes to the event bus and, for every
//! `booking.confirmed` event, sends one confirmation to the booking's
//! contact. A [`SendGuard`] suppresses repeats for the same booking within
//! its window, so provider callback re-deliveries never produce a second
//! notification.

use std::sync::Arc;

use cinebook_core::types::{Amount, DbId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::bus::{PlatformEvent, BOOKING_CONFIRMED};
use crate::dedup::SendGuard;
use crate::delivery::ConfirmationSender;

/// Payload of a `booking.confirmed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub booking_id: DbId,
    pub booking_code: String,
    pub contact_email: Option<String>,
    pub amount: Amount,
    pub transaction_id: String,
    pub provider: String,
}

impl BookingConfirmation {
    pub fn into_event(self) -> PlatformEvent {
        let booking_id = self.booking_id;
        PlatformEvent::new(BOOKING_CONFIRMED)
            .with_source("booking", booking_id)
            .with_payload(serde_json::to_value(self).unwrap_or_default())
    }

    /// Decode a `booking.confirmed` event; `None` for any other event.
    pub fn from_event(event: &PlatformEvent) -> Option<Self> {
        if event.event_type != BOOKING_CONFIRMED {
            return None;
        }
        serde_json::from_value(event.payload.clone()).ok()
    }
}

pub struct ConfirmationDispatcher {
    guard: SendGuard,
    sender: Arc<dyn ConfirmationSender>,
}

impl ConfirmationDispatcher {
    pub fn new(sender: Arc<dyn ConfirmationSender>) -> Self {
        Self {
            guard: SendGuard::default(),
            sender,
        }
    }

    /// Run the dispatch loop until the event bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.handle(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Confirmation dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, confirmation dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Process one event. Returns whether a confirmation was sent.
    pub async fn handle(&self, event: &PlatformEvent) -> bool {
        let Some(confirmation) = BookingConfirmation::from_event(event) else {
            if event.event_type == BOOKING_CONFIRMED {
                tracing::warn!(payload = %event.payload, "Malformed booking.confirmed payload");
            }
            return false;
        };

        if !self.guard.try_claim(confirmation.booking_id) {
            tracing::debug!(
                booking_id = confirmation.booking_id,
                "Confirmation already sent recently, skipping"
            );
            return false;
        }

        match self.sender.send(&confirmation).await {
            Ok(()) => true,
            Err(e) => {
                self.guard.release(confirmation.booking_id);
                tracing::error!(
                    booking_id = confirmation.booking_id,
                    error = %e,
                    "Failed to send booking confirmation"
                );
                false
            }
        }
    }
}
