//! Best-effort duplicate suppression for outbound notifications.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use cinebook_core::types::DbId;
use tokio::time::Instant;

/// Window during which a second confirmation for the same booking is
/// suppressed.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Remembers which bookings were notified recently.
///
/// Process-local and in-memory: a restart forgets everything, so this only
/// guarantees at most one send per window within one process.
pub struct SendGuard {
    window: Duration,
    sent: Mutex<HashMap<DbId, Instant>>,
}

impl SendGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            sent: Mutex::new(HashMap::new()),
        }
    }

    /// Claim the right to notify for `booking_id`.
    ///
    /// Returns `false` when a claim for the same booking was made within the
    /// window. Expired entries are pruned on every call.
    pub fn try_claim(&self, booking_id: DbId) -> bool {
        let now = Instant::now();
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.retain(|_, at| now.duration_since(*at) < self.window);

        if sent.contains_key(&booking_id) {
            return false;
        }
        sent.insert(booking_id, now);
        true
    }

    /// Forget a claim, e.g. after the send itself failed.
    pub fn release(&self, booking_id: DbId) {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&booking_id);
    }
}

impl Default for SendGuard {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_claim_within_window_is_refused() {
        let guard = SendGuard::default();
        assert!(guard.try_claim(100));
        assert!(!guard.try_claim(100));
        assert!(guard.try_claim(101), "other bookings are independent");
    }

    #[tokio::test(start_paused = true)]
    async fn claim_is_allowed_again_after_window() {
        let guard = SendGuard::default();
        assert!(guard.try_claim(100));

        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        assert!(!guard.try_claim(100));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(guard.try_claim(100));
    }

    #[tokio::test(start_paused = true)]
    async fn released_claim_can_be_retaken() {
        let guard = SendGuard::default();
        assert!(guard.try_claim(100));
        guard.release(100);
        assert!(guard.try_claim(100));
    }
}
