//! Repository for the `seat_locks` table.
//!
//! Expiry is always evaluated against the caller-supplied `now`, never the
//! database clock, so the lock manager's clock stays authoritative.

use cinebook_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::seat_lock::SeatLockRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "showtime_id, seat_id, session_id, expires_at, created_at, updated_at";

pub struct SeatLockRepo;

impl SeatLockRepo {
    /// Conditional upsert: insert, or take over the row when it is held by
    /// `session_id` or expired at `now`. Returns `None` when another
    /// session's unexpired lock blocks the write.
    ///
    /// A same-holder refresh keeps the later of the two expiries.
    pub async fn upsert_if_available(
        pool: &PgPool,
        showtime_id: DbId,
        seat_id: DbId,
        session_id: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<Option<SeatLockRow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO seat_locks (showtime_id, seat_id, session_id, expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (showtime_id, seat_id) DO UPDATE
             SET session_id = EXCLUDED.session_id,
                 expires_at = CASE
                     WHEN seat_locks.session_id = EXCLUDED.session_id
                         THEN GREATEST(seat_locks.expires_at, EXCLUDED.expires_at)
                     ELSE EXCLUDED.expires_at
                 END
             WHERE seat_locks.session_id = EXCLUDED.session_id
                OR seat_locks.expires_at < $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SeatLockRow>(&query)
            .bind(showtime_id)
            .bind(seat_id)
            .bind(session_id)
            .bind(expires_at)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Delete an unexpired lock held by `session_id`. Returns `true` if a
    /// row was removed.
    pub async fn delete_if_held(
        pool: &PgPool,
        showtime_id: DbId,
        seat_id: DbId,
        session_id: &str,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM seat_locks
             WHERE showtime_id = $1 AND seat_id = $2
               AND session_id = $3 AND expires_at >= $4",
        )
        .bind(showtime_id)
        .bind(seat_id)
        .bind(session_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete and return every row owned by `session_id`, expired or not.
    pub async fn delete_all_by_session(
        pool: &PgPool,
        session_id: &str,
    ) -> Result<Vec<SeatLockRow>, sqlx::Error> {
        let query = format!("DELETE FROM seat_locks WHERE session_id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, SeatLockRow>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }

    /// Unexpired locks for a showtime, ordered by seat.
    pub async fn list_active(
        pool: &PgPool,
        showtime_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<SeatLockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM seat_locks
             WHERE showtime_id = $1 AND expires_at >= $2
             ORDER BY seat_id"
        );
        sqlx::query_as::<_, SeatLockRow>(&query)
            .bind(showtime_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    pub async fn find_active(
        pool: &PgPool,
        showtime_id: DbId,
        seat_id: DbId,
        now: Timestamp,
    ) -> Result<Option<SeatLockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM seat_locks
             WHERE showtime_id = $1 AND seat_id = $2 AND expires_at >= $3"
        );
        sqlx::query_as::<_, SeatLockRow>(&query)
            .bind(showtime_id)
            .bind(seat_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Delete and return every row whose expiry is before `now`.
    pub async fn delete_expired(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<SeatLockRow>, sqlx::Error> {
        let query = format!("DELETE FROM seat_locks WHERE expires_at < $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, SeatLockRow>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }
}
