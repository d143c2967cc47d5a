//! Time source used by the seat-lock manager.
//!
//! Lock expiry is always computed from an injected [`Clock`] rather than
//! calling `Utc::now()` inline, so expiry can be driven deterministically in
//! tests with [`ManualClock`].

use std::sync::Mutex;

use chrono::Utc;

use crate::types::Timestamp;

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a clock frozen at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, instant: Timestamp) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::starting_now();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance(chrono::Duration::seconds(90));
        assert_eq!(clock.now() - t0, chrono::Duration::seconds(90));
    }

    #[test]
    fn manual_clock_set_jumps_to_instant() {
        let clock = ManualClock::starting_now();
        let target = clock.now() - chrono::Duration::hours(1);
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
