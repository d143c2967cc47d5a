use std::sync::Arc;

use crate::clock::Clock;
use crate::types::DbId;

use super::{LockStore, SeatKey, SeatLock, SeatLockError};

/// Mediates exclusive, time-bounded claims on seats.
///
/// All lock mutations in the system go through this type. Conflicts are
/// reported immediately and never retried or queued.
pub struct SeatLockManager {
    store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl SeatLockManager {
    pub fn new(store: Arc<dyn LockStore>, clock: Arc<dyn Clock>, ttl: chrono::Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Lock lifetime applied on every acquire.
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Claim a seat for `holder`, or extend the holder's existing claim.
    ///
    /// Fails with [`SeatLockError::Conflict`] when another session holds an
    /// unexpired lock on the seat.
    pub async fn acquire(
        &self,
        showtime_id: DbId,
        seat_id: DbId,
        holder: &str,
    ) -> Result<SeatLock, SeatLockError> {
        let key = SeatKey::new(showtime_id, seat_id);
        let now = self.clock.now();
        let expires_at = now + self.ttl;

        self.store
            .upsert_if_available(key, holder, expires_at, now)
            .await?
            .ok_or(SeatLockError::Conflict {
                showtime_id,
                seat_id,
            })
    }

    /// Release a seat held by `holder`.
    ///
    /// Returns `false` (not an error) when the seat is unlocked or held by
    /// someone else, so it is safe to call speculatively.
    pub async fn release(
        &self,
        showtime_id: DbId,
        seat_id: DbId,
        holder: &str,
    ) -> Result<bool, SeatLockError> {
        let now = self.clock.now();
        self.store
            .delete_if_held(SeatKey::new(showtime_id, seat_id), holder, now)
            .await
    }

    /// Release every seat owned by `holder` and report which ones were freed.
    pub async fn release_all_by_holder(&self, holder: &str) -> Result<Vec<SeatKey>, SeatLockError> {
        let released = self.store.delete_all_by_holder(holder).await?;
        Ok(released.iter().map(SeatLock::key).collect())
    }

    /// Unexpired locks for a showtime.
    pub async fn list_active(&self, showtime_id: DbId) -> Result<Vec<SeatLock>, SeatLockError> {
        self.store.find_active(showtime_id, self.clock.now()).await
    }

    /// The unexpired lock on a seat, if any.
    pub async fn peek(
        &self,
        showtime_id: DbId,
        seat_id: DbId,
    ) -> Result<Option<SeatLock>, SeatLockError> {
        self.store
            .find_active_seat(SeatKey::new(showtime_id, seat_id), self.clock.now())
            .await
    }

    /// Physically remove every expired lock. Returns the removed rows.
    pub async fn sweep_expired(&self) -> Result<Vec<SeatLock>, SeatLockError> {
        self.store.delete_expired(self.clock.now()).await
    }
}
