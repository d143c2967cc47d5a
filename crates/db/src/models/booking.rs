//! Booking rows. Bookings are created by the checkout flow; this crate only
//! reads them and applies the payment transition.

use cinebook_core::types::{Amount, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::{BookingPaymentStatus, BookingStatus, StatusId};

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub booking_code: String,
    pub showtime_id: DbId,
    pub contact_email: Option<String>,
    pub total_amount: Amount,
    pub status_id: StatusId,
    pub payment_status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    pub fn is_paid(&self) -> bool {
        self.payment_status_id == BookingPaymentStatus::Paid.id()
    }

    pub fn is_confirmed(&self) -> bool {
        self.status_id == BookingStatus::Confirmed.id()
    }
}

/// Insert DTO, used by the checkout flow and by tests.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub booking_code: String,
    pub showtime_id: DbId,
    pub contact_email: Option<String>,
    pub total_amount: Amount,
}
