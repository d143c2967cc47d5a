//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` (or a connection, for steps that run inside a caller's
//! transaction) as the first argument.

pub mod booking_repo;
pub mod payment_repo;
pub mod seat_lock_repo;

pub use booking_repo::BookingRepo;
pub use payment_repo::PaymentRepo;
pub use seat_lock_repo::SeatLockRepo;
