//! Repository for the `payments` table.
//!
//! Payment status and the booking's payment fields change together, inside
//! the transactions below, and nowhere else.

use sqlx::PgPool;

use crate::models::payment::{
    CreatePayment, Payment, PaymentStatusView, ProviderResult, SettlementOutcome,
};
use crate::models::status::PaymentStatus;
use crate::repositories::BookingRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, transaction_id, booking_id, provider, amount, status_id, \
                       provider_return_code, provider_message, raw_payload, \
                       created_at, updated_at";

pub struct PaymentRepo;

impl PaymentRepo {
    /// Record a pending payment and mark its booking unpaid, atomically.
    ///
    /// Returns `None` (and writes nothing) when the booking is missing or
    /// was paid in the meantime.
    pub async fn create_pending(
        pool: &PgPool,
        input: &CreatePayment,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !BookingRepo::mark_unpaid(&mut *tx, input.booking_id).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO payments (transaction_id, booking_id, provider, amount, status_id, raw_payload)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(&input.transaction_id)
            .bind(input.booking_id)
            .bind(input.provider.as_str())
            .bind(input.amount)
            .bind(PaymentStatus::Pending.id())
            .bind(&input.raw_payload)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(payment))
    }

    pub async fn find_by_transaction_id(
        pool: &PgPool,
        transaction_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE transaction_id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(transaction_id)
            .fetch_optional(pool)
            .await
    }

    /// Payment plus booking state, for the status endpoint.
    pub async fn find_status_view(
        pool: &PgPool,
        transaction_id: &str,
    ) -> Result<Option<PaymentStatusView>, sqlx::Error> {
        sqlx::query_as::<_, PaymentStatusView>(
            "SELECT p.transaction_id, p.status_id, p.booking_id, b.booking_code,
                    b.status_id AS booking_status_id,
                    b.payment_status_id AS booking_payment_status_id,
                    p.amount, p.updated_at
             FROM payments p
             JOIN bookings b ON b.id = p.booking_id
             WHERE p.transaction_id = $1",
        )
        .bind(transaction_id)
        .fetch_optional(pool)
        .await
    }

    /// Apply a verified provider result to the payment `transaction_id`.
    ///
    /// The payment row is locked for the duration. Only a pending payment
    /// with a successful result transitions, and then the booking becomes
    /// paid and confirmed in the same transaction. Re-delivery of a result
    /// for a payment that already left `pending` writes nothing.
    pub async fn settle(
        pool: &PgPool,
        transaction_id: &str,
        result: &ProviderResult,
    ) -> Result<SettlementOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM payments WHERE transaction_id = $1 FOR UPDATE");
        let Some(payment) = sqlx::query_as::<_, Payment>(&query)
            .bind(transaction_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(SettlementOutcome::NotFound);
        };

        if !payment.is_pending() {
            tx.rollback().await?;
            return Ok(SettlementOutcome::AlreadyProcessed { payment });
        }

        if let Some(received) = result.verify_amount {
            if received != payment.amount {
                tx.rollback().await?;
                return Ok(SettlementOutcome::AmountMismatch {
                    expected: payment.amount,
                    received,
                });
            }
        }

        let new_status = if result.succeeded {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Pending
        };

        let query = format!(
            "UPDATE payments
             SET status_id = $2, provider_return_code = $3, provider_message = $4, raw_payload = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(payment.id)
            .bind(new_status.id())
            .bind(&result.return_code)
            .bind(&result.message)
            .bind(&result.raw_payload)
            .fetch_one(&mut *tx)
            .await?;

        if !result.succeeded {
            tx.commit().await?;
            return Ok(SettlementOutcome::Declined { payment });
        }

        let booking = BookingRepo::confirm_paid(&mut *tx, payment.booking_id).await?;
        tx.commit().await?;

        Ok(SettlementOutcome::Confirmed { payment, booking })
    }
}
