//! Row models and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row plus the input DTOs its repository accepts.

pub mod booking;
pub mod payment;
pub mod seat_lock;
pub mod status;
