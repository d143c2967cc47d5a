//! Request handlers.
//!
//! Handlers stay thin: they extract and validate path and body input, then
//! delegate to the payment adapters or repositories and map errors via
//! [`AppError`](crate::error::AppError).

pub mod payments;
