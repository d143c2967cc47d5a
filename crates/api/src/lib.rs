//! Cinebook HTTP and WebSocket server.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! build the same router through [`router::build_app_router`].

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod payments;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
