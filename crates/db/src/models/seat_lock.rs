//! Seat lock rows.

use cinebook_core::seat_lock::SeatLock;
use cinebook_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `seat_locks` table.
#[derive(Debug, Clone, FromRow)]
pub struct SeatLockRow {
    pub showtime_id: DbId,
    pub seat_id: DbId,
    pub session_id: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SeatLockRow> for SeatLock {
    fn from(row: SeatLockRow) -> Self {
        SeatLock {
            showtime_id: row.showtime_id,
            seat_id: row.seat_id,
            session_id: row.session_id,
            expires_at: row.expires_at,
        }
    }
}
