//! Postgres-backed [`LockStore`].

use async_trait::async_trait;
use cinebook_core::seat_lock::{LockStore, SeatKey, SeatLock, SeatLockError};
use cinebook_core::types::{DbId, Timestamp};

use crate::repositories::SeatLockRepo;
use crate::DbPool;

/// [`LockStore`] over the `seat_locks` table.
///
/// Acquisition relies on `INSERT ... ON CONFLICT DO UPDATE ... WHERE`, which
/// Postgres evaluates atomically per row, so concurrent acquires on one seat
/// have exactly one winner across processes.
#[derive(Clone)]
pub struct PgLockStore {
    pool: DbPool,
}

impl PgLockStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn store_error(err: sqlx::Error) -> SeatLockError {
    tracing::error!(error = %err, "Seat lock query failed");
    SeatLockError::Store(err.to_string())
}

#[async_trait]
impl LockStore for PgLockStore {
    async fn upsert_if_available(
        &self,
        key: SeatKey,
        holder: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<Option<SeatLock>, SeatLockError> {
        let row = SeatLockRepo::upsert_if_available(
            &self.pool,
            key.showtime_id,
            key.seat_id,
            holder,
            expires_at,
            now,
        )
        .await
        .map_err(store_error)?;
        Ok(row.map(SeatLock::from))
    }

    async fn delete_if_held(
        &self,
        key: SeatKey,
        holder: &str,
        now: Timestamp,
    ) -> Result<bool, SeatLockError> {
        SeatLockRepo::delete_if_held(&self.pool, key.showtime_id, key.seat_id, holder, now)
            .await
            .map_err(store_error)
    }

    async fn delete_all_by_holder(&self, holder: &str) -> Result<Vec<SeatLock>, SeatLockError> {
        let rows = SeatLockRepo::delete_all_by_session(&self.pool, holder)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(SeatLock::from).collect())
    }

    async fn find_active(
        &self,
        showtime_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<SeatLock>, SeatLockError> {
        let rows = SeatLockRepo::list_active(&self.pool, showtime_id, now)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(SeatLock::from).collect())
    }

    async fn find_active_seat(
        &self,
        key: SeatKey,
        now: Timestamp,
    ) -> Result<Option<SeatLock>, SeatLockError> {
        let row = SeatLockRepo::find_active(&self.pool, key.showtime_id, key.seat_id, now)
            .await
            .map_err(store_error)?;
        Ok(row.map(SeatLock::from))
    }

    async fn delete_expired(&self, now: Timestamp) -> Result<Vec<SeatLock>, SeatLockError> {
        let rows = SeatLockRepo::delete_expired(&self.pool, now)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(SeatLock::from).collect())
    }
}
