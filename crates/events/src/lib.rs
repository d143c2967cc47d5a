//! Cinebook event bus and booking notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`ConfirmationDispatcher`]: consumes `booking.confirmed` events and
//!   sends one confirmation per booking per dedupe window.
//! - [`delivery`]: outbound channels (SMTP email, log-only fallback).

pub mod bus;
pub mod confirmation;
pub mod dedup;
pub mod delivery;

pub use bus::{EventBus, PlatformEvent, BOOKING_CONFIRMED};
pub use confirmation::{BookingConfirmation, ConfirmationDispatcher};
pub use dedup::SendGuard;
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::{ConfirmationSender, LogDelivery};
