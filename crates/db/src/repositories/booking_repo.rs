//! Repository for the `bookings` table.

use cinebook_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::booking::{Booking, CreateBooking};
use crate::models::status::{BookingPaymentStatus, BookingStatus};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, booking_code, showtime_id, contact_email, total_amount, \
                       status_id, payment_status_id, created_at, updated_at";

/// Reads bookings and applies payment-driven transitions.
pub struct BookingRepo;

impl BookingRepo {
    /// Insert a new booking (pending, unpaid), returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateBooking) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings (booking_code, showtime_id, contact_email, total_amount)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(&input.booking_code)
            .bind(input.showtime_id)
            .bind(&input.contact_email)
            .bind(input.total_amount)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a booking unpaid while a new provider order is outstanding.
    ///
    /// Never moves a paid booking backwards: returns `false` when the booking
    /// is missing or already paid.
    pub async fn mark_unpaid(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings SET payment_status_id = $2
             WHERE id = $1 AND payment_status_id <> $3",
        )
        .bind(id)
        .bind(BookingPaymentStatus::Unpaid.id())
        .bind(BookingPaymentStatus::Paid.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set a booking paid and confirmed together.
    ///
    /// Must run inside the transaction that completes the payment.
    pub async fn confirm_paid(conn: &mut PgConnection, id: DbId) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET payment_status_id = $2, status_id = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(BookingPaymentStatus::Paid.id())
            .bind(BookingStatus::Confirmed.id())
            .fetch_one(conn)
            .await
    }
}
