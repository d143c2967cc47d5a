//! Cinebook domain core.
//!
//! Pure domain logic with zero internal dependencies: id/timestamp aliases,
//! the shared error type, the seat-lock manager and its store seam, and the
//! payment provider signing rules.

pub mod clock;
pub mod error;
pub mod hashing;
pub mod payment;
pub mod seat_lock;
pub mod types;
