use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::types::{DbId, Timestamp};

use super::{LockStore, SeatKey, SeatLock, SeatLockError};

/// Process-local [`LockStore`] backed by a mutex-guarded map.
///
/// The mutex makes every operation atomic, which gives the same single-winner
/// guarantee as the Postgres conditional upsert. State is not shared across
/// processes.
#[derive(Default)]
pub struct InMemoryLockStore {
    locks: Mutex<HashMap<SeatKey, SeatLock>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, expired ones included.
    pub async fn row_count(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Number of stored rows owned by `holder`, expired ones included.
    pub async fn count_held_by(&self, holder: &str) -> usize {
        self.locks
            .lock()
            .await
            .values()
            .filter(|lock| lock.is_held_by(holder))
            .count()
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn upsert_if_available(
        &self,
        key: SeatKey,
        holder: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<Option<SeatLock>, SeatLockError> {
        let mut locks = self.locks.lock().await;

        let expires_at = match locks.get(&key) {
            Some(existing) if existing.is_held_by(holder) => existing.expires_at.max(expires_at),
            Some(existing) if existing.is_active_at(now) => return Ok(None),
            _ => expires_at,
        };

        let lock = SeatLock {
            showtime_id: key.showtime_id,
            seat_id: key.seat_id,
            session_id: holder.to_string(),
            expires_at,
        };
        locks.insert(key, lock.clone());
        Ok(Some(lock))
    }

    async fn delete_if_held(
        &self,
        key: SeatKey,
        holder: &str,
        now: Timestamp,
    ) -> Result<bool, SeatLockError> {
        let mut locks = self.locks.lock().await;
        let held = locks
            .get(&key)
            .is_some_and(|lock| lock.is_held_by(holder) && lock.is_active_at(now));
        if held {
            locks.remove(&key);
        }
        Ok(held)
    }

    async fn delete_all_by_holder(&self, holder: &str) -> Result<Vec<SeatLock>, SeatLockError> {
        let mut locks = self.locks.lock().await;
        let keys: Vec<SeatKey> = locks
            .iter()
            .filter(|(_, lock)| lock.is_held_by(holder))
            .map(|(key, _)| *key)
            .collect();

        Ok(keys.iter().filter_map(|key| locks.remove(key)).collect())
    }

    async fn find_active(
        &self,
        showtime_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<SeatLock>, SeatLockError> {
        let locks = self.locks.lock().await;
        let mut active: Vec<SeatLock> = locks
            .values()
            .filter(|lock| lock.showtime_id == showtime_id && lock.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by_key(|lock| lock.seat_id);
        Ok(active)
    }

    async fn find_active_seat(
        &self,
        key: SeatKey,
        now: Timestamp,
    ) -> Result<Option<SeatLock>, SeatLockError> {
        let locks = self.locks.lock().await;
        Ok(locks.get(&key).filter(|lock| lock.is_active_at(now)).cloned())
    }

    async fn delete_expired(&self, now: Timestamp) -> Result<Vec<SeatLock>, SeatLockError> {
        let mut locks = self.locks.lock().await;
        let expired: Vec<SeatKey> = locks
            .iter()
            .filter(|(_, lock)| !lock.is_active_at(now))
            .map(|(key, _)| *key)
            .collect();

        Ok(expired.iter().filter_map(|key| locks.remove(key)).collect())
    }
}
