//! Seat operations for the seats WebSocket.
//!
//! Every lock mutation goes through [`SeatLockManager`]; broadcasts are
//! issued on the calling task right after the manager returns. Lock
//! failures are reported in the ack and never close the connection.

use std::sync::Arc;

use cinebook_core::seat_lock::{SeatLockError, SeatLockManager};
use cinebook_core::types::DbId;

use super::manager::WsManager;
use super::protocol::{
    text_frame, AckBody, AckFrame, ClientEvent, ClientFrame, ErrorPayload, ServerEvent,
};

pub struct SeatGateway {
    locks: Arc<SeatLockManager>,
    ws: Arc<WsManager>,
}

impl SeatGateway {
    pub fn new(locks: Arc<SeatLockManager>, ws: Arc<WsManager>) -> Self {
        Self { locks, ws }
    }

    pub fn ws(&self) -> &Arc<WsManager> {
        &self.ws
    }

    /// Handle one text frame from `conn_id` and send the reply to it.
    pub async fn handle_text(&self, conn_id: &str, text: &str) {
        let frame = match ClientFrame::parse(text) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::debug!(conn_id, error = %err, "Rejected client frame");
                self.send_error(conn_id, err.id, err.message).await;
                return;
            }
        };

        let ack = self.dispatch(conn_id, frame.event).await;
        self.ws
            .send_to(conn_id, text_frame(&AckFrame::new(frame.id, frame.event.name(), &ack)))
            .await;
    }

    /// Send an `error` frame to one connection.
    pub async fn send_error(&self, conn_id: &str, id: Option<u64>, error: impl Into<String>) {
        let event = ServerEvent::Error(ErrorPayload {
            id,
            error: error.into(),
        });
        self.ws.send_to(conn_id, text_frame(&event)).await;
    }

    pub async fn dispatch(&self, conn_id: &str, event: ClientEvent) -> AckBody {
        match event {
            ClientEvent::JoinShowtime(r) => self.join_showtime(conn_id, r.showtime_id).await,
            ClientEvent::LeaveShowtime(r) => self.leave_showtime(conn_id, r.showtime_id).await,
            ClientEvent::LockSeat(r) => self.lock_seat(conn_id, r.showtime_id, r.seat_id).await,
            ClientEvent::UnlockSeat(r) => self.unlock_seat(conn_id, r.showtime_id, r.seat_id).await,
            ClientEvent::GetLockedSeats(r) => self.locked_seats(r.showtime_id).await,
        }
    }

    /// Join a showtime room and return its current locks.
    pub async fn join_showtime(&self, conn_id: &str, showtime_id: DbId) -> AckBody {
        if !self.ws.join_room(conn_id, showtime_id).await {
            return AckBody::failed("Connection is not registered");
        }
        tracing::debug!(conn_id, showtime_id, "Joined showtime room");
        self.locked_seats(showtime_id).await
    }

    /// Leave a showtime room. Locks held by the connection are kept.
    pub async fn leave_showtime(&self, conn_id: &str, showtime_id: DbId) -> AckBody {
        self.ws.leave_room(conn_id, showtime_id).await;
        tracing::debug!(conn_id, showtime_id, "Left showtime room");
        AckBody::ok()
    }

    pub async fn lock_seat(&self, conn_id: &str, showtime_id: DbId, seat_id: DbId) -> AckBody {
        match self.locks.acquire(showtime_id, seat_id, conn_id).await {
            Ok(lock) => {
                self.ws
                    .broadcast_to_room(
                        showtime_id,
                        text_frame(&ServerEvent::seat_locked(&lock)),
                        Some(conn_id),
                    )
                    .await;
                tracing::debug!(conn_id, showtime_id, seat_id, "Seat locked");
                AckBody::with_lock(&lock)
            }
            Err(err @ SeatLockError::Conflict { .. }) => {
                tracing::debug!(conn_id, showtime_id, seat_id, "Seat lock conflict");
                AckBody::failed(err.to_string())
            }
            Err(err) => {
                tracing::error!(conn_id, showtime_id, seat_id, error = %err, "Seat lock failed");
                AckBody::failed("Failed to lock seat")
            }
        }
    }

    pub async fn unlock_seat(&self, conn_id: &str, showtime_id: DbId, seat_id: DbId) -> AckBody {
        match self.locks.release(showtime_id, seat_id, conn_id).await {
            Ok(true) => {
                self.ws
                    .broadcast_to_room(
                        showtime_id,
                        text_frame(&ServerEvent::seat_unlocked(showtime_id, seat_id, conn_id)),
                        None,
                    )
                    .await;
                tracing::debug!(conn_id, showtime_id, seat_id, "Seat unlocked");
                AckBody::ok()
            }
            Ok(false) => AckBody::failed("Seat is not locked by this session"),
            Err(err) => {
                tracing::error!(conn_id, showtime_id, seat_id, error = %err, "Seat unlock failed");
                AckBody::failed("Failed to unlock seat")
            }
        }
    }

    pub async fn locked_seats(&self, showtime_id: DbId) -> AckBody {
        match self.locks.list_active(showtime_id).await {
            Ok(locks) => AckBody::with_locked_seats(locks),
            Err(err) => {
                tracing::error!(showtime_id, error = %err, "Failed to list locked seats");
                AckBody::failed("Failed to load locked seats")
            }
        }
    }

    /// Tear down a connection: drop it from all rooms, then release every
    /// lock it held and announce each release to the seat's showtime room.
    pub async fn disconnect(&self, conn_id: &str) {
        self.ws.remove(conn_id).await;

        match self.locks.release_all_by_holder(conn_id).await {
            Ok(released) => {
                for key in &released {
                    self.ws
                        .broadcast_to_room(
                            key.showtime_id,
                            text_frame(&ServerEvent::seat_unlocked(
                                key.showtime_id,
                                key.seat_id,
                                conn_id,
                            )),
                            None,
                        )
                        .await;
                }
                if !released.is_empty() {
                    tracing::info!(
                        conn_id,
                        released = released.len(),
                        "Released seats on disconnect"
                    );
                }
            }
            Err(err) => {
                tracing::error!(conn_id, error = %err, "Failed to release seats on disconnect");
            }
        }
    }

    /// Remove expired locks. With `broadcast`, each removal is announced to
    /// its showtime room. Returns the number of rows removed.
    pub async fn sweep_expired(&self, broadcast: bool) -> Result<usize, SeatLockError> {
        let expired = self.locks.sweep_expired().await?;
        if broadcast {
            for lock in &expired {
                self.ws
                    .broadcast_to_room(
                        lock.showtime_id,
                        text_frame(&ServerEvent::seat_unlocked(
                            lock.showtime_id,
                            lock.seat_id,
                            &lock.session_id,
                        )),
                        None,
                    )
                    .await;
            }
        }
        Ok(expired.len())
    }
}
