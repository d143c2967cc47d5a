//! WebSocket infrastructure for real-time seat availability.
//!
//! Provides connection and room management, the seats protocol and gateway,
//! heartbeat monitoring, and the HTTP upgrade handler used by Axum routes.

pub mod gateway;
mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;

pub use gateway::SeatGateway;
pub use handler::seats_ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
