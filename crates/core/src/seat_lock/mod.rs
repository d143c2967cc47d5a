//! Time-bounded exclusive claims on `(showtime, seat)` pairs.
//!
//! A [`SeatLock`] whose `expires_at` lies in the past is semantically absent:
//! every read filters on `expires_at >= now`, and the physical row is left for
//! the expiry sweeper to reclaim. While an unexpired lock exists, only its
//! holder may refresh or release it.
//!
//! The [`LockStore`] trait is the persistence seam. Its conditional upsert
//! must be a single atomic operation in the backing store; the
//! [`SeatLockManager`] never reads-then-writes to decide ownership.

mod manager;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

pub use manager::SeatLockManager;
pub use memory::InMemoryLockStore;

/// Default lock lifetime: 10 minutes, matching the checkout session timeout.
pub const DEFAULT_LOCK_TTL_SECS: i64 = 600;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Composite identity of a lockable seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatKey {
    pub showtime_id: DbId,
    pub seat_id: DbId,
}

impl SeatKey {
    pub fn new(showtime_id: DbId, seat_id: DbId) -> Self {
        Self {
            showtime_id,
            seat_id,
        }
    }
}

/// A claim on one seat for one showtime, owned by a real-time session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatLock {
    pub showtime_id: DbId,
    pub seat_id: DbId,
    /// Opaque connection identifier of the holder.
    pub session_id: String,
    pub expires_at: Timestamp,
}

impl SeatLock {
    pub fn key(&self) -> SeatKey {
        SeatKey::new(self.showtime_id, self.seat_id)
    }

    /// Whether the lock still counts as held at `now`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.expires_at >= now
    }

    pub fn is_held_by(&self, holder: &str) -> bool {
        self.session_id == holder
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failures surfaced by the seat-lock manager.
#[derive(Debug, thiserror::Error)]
pub enum SeatLockError {
    /// Another session holds an unexpired lock on the seat.
    #[error("Seat {seat_id} for showtime {showtime_id} is already locked by another session")]
    Conflict { showtime_id: DbId, seat_id: DbId },

    /// The backing store failed (connection loss, query error, ...).
    #[error("Lock store error: {0}")]
    Store(String),
}

impl From<SeatLockError> for CoreError {
    fn from(err: SeatLockError) -> Self {
        match err {
            SeatLockError::Conflict { .. } => CoreError::Conflict(err.to_string()),
            SeatLockError::Store(msg) => CoreError::Internal(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Persistence operations behind the seat-lock manager.
///
/// Every method receives `now` from the manager's clock; implementations must
/// not consult their own notion of time.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Insert a lock for `key`, or overwrite the existing row when it is held
    /// by `holder` or has expired, in one atomic step.
    ///
    /// A same-holder refresh never moves `expires_at` backwards. Returns
    /// `None` when an unexpired lock held by a different session blocks the
    /// write.
    async fn upsert_if_available(
        &self,
        key: SeatKey,
        holder: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<Option<SeatLock>, SeatLockError>;

    /// Delete the lock for `key` if it is unexpired and held by `holder`.
    async fn delete_if_held(
        &self,
        key: SeatKey,
        holder: &str,
        now: Timestamp,
    ) -> Result<bool, SeatLockError>;

    /// Atomically delete and return every lock row owned by `holder`.
    async fn delete_all_by_holder(&self, holder: &str) -> Result<Vec<SeatLock>, SeatLockError>;

    /// All unexpired locks for a showtime, ordered by seat.
    async fn find_active(
        &self,
        showtime_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<SeatLock>, SeatLockError>;

    /// The unexpired lock for one seat, if any.
    async fn find_active_seat(
        &self,
        key: SeatKey,
        now: Timestamp,
    ) -> Result<Option<SeatLock>, SeatLockError>;

    /// Delete and return every lock whose `expires_at` is before `now`.
    async fn delete_expired(&self, now: Timestamp) -> Result<Vec<SeatLock>, SeatLockError>;
}
