//! JSON frames of the seats socket.
//!
//! Client frames are `{"id"?: n, "event": "<name>", "data": {...}}`. Every
//! request is answered with `{"event": "ack", "id": n, "for": "<name>",
//! "data": {...}}`; pushes use `{"event": "<name>", "data": {...}}`.

use axum::extract::ws::Message;
use cinebook_core::seat_lock::SeatLock;
use cinebook_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::from_value;

pub const JOIN_SHOWTIME: &str = "joinShowtime";
pub const LEAVE_SHOWTIME: &str = "leaveShowtime";
pub const LOCK_SEAT: &str = "lockSeat";
pub const UNLOCK_SEAT: &str = "unlockSeat";
pub const GET_LOCKED_SEATS: &str = "getLockedSeats";

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    id: Option<u64>,
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowtimeRef {
    pub showtime_id: DbId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatRef {
    pub showtime_id: DbId,
    pub seat_id: DbId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    JoinShowtime(ShowtimeRef),
    LeaveShowtime(ShowtimeRef),
    LockSeat(SeatRef),
    UnlockSeat(SeatRef),
    GetLockedSeats(ShowtimeRef),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinShowtime(_) => JOIN_SHOWTIME,
            Self::LeaveShowtime(_) => LEAVE_SHOWTIME,
            Self::LockSeat(_) => LOCK_SEAT,
            Self::UnlockSeat(_) => UNLOCK_SEAT,
            Self::GetLockedSeats(_) => GET_LOCKED_SEATS,
        }
    }
}

/// A parsed client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientFrame {
    pub id: Option<u64>,
    pub event: ClientEvent,
}

/// Why a client frame was rejected. Carries the frame id when one could be
/// read, so the error can still be correlated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FrameError {
    pub id: Option<u64>,
    pub message: String,
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let raw: RawFrame = serde_json::from_str(text).map_err(|e| FrameError {
            id: None,
            message: format!("Malformed frame: {e}"),
        })?;

        let id = raw.id;
        let invalid = |e: serde_json::Error| FrameError {
            id,
            message: format!("Invalid {} payload: {e}", raw.event),
        };

        let data = raw.data;
        let event = match raw.event.as_str() {
            JOIN_SHOWTIME => ClientEvent::JoinShowtime(from_value(data).map_err(invalid)?),
            LEAVE_SHOWTIME => ClientEvent::LeaveShowtime(from_value(data).map_err(invalid)?),
            LOCK_SEAT => ClientEvent::LockSeat(from_value(data).map_err(invalid)?),
            UNLOCK_SEAT => ClientEvent::UnlockSeat(from_value(data).map_err(invalid)?),
            GET_LOCKED_SEATS => ClientEvent::GetLockedSeats(from_value(data).map_err(invalid)?),
            other => {
                return Err(FrameError {
                    id,
                    message: format!("Unknown event '{other}'"),
                })
            }
        };

        Ok(Self { id, event })
    }
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// One entry of a locked-seat snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedSeat {
    pub seat_id: DbId,
    pub session_id: String,
    pub expires_at: Timestamp,
}

impl From<SeatLock> for LockedSeat {
    fn from(lock: SeatLock) -> Self {
        Self {
            seat_id: lock.seat_id,
            session_id: lock.session_id,
            expires_at: lock.expires_at,
        }
    }
}

/// The caller's own lock, returned on a successful `lockSeat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockInfo {
    pub seat_id: DbId,
    pub expires_at: Timestamp,
}

/// Acknowledgement payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckBody {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_seats: Option<Vec<LockedSeat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockInfo>,
}

impl AckBody {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_locked_seats(locks: Vec<SeatLock>) -> Self {
        Self {
            locked_seats: Some(locks.into_iter().map(LockedSeat::from).collect()),
            ..Self::ok()
        }
    }

    pub fn with_lock(lock: &SeatLock) -> Self {
        Self {
            lock: Some(LockInfo {
                seat_id: lock.seat_id,
                expires_at: lock.expires_at,
            }),
            ..Self::ok()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AckFrame<'a> {
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(rename = "for")]
    request: &'a str,
    data: &'a AckBody,
}

impl<'a> AckFrame<'a> {
    pub fn new(id: Option<u64>, request: &'a str, data: &'a AckBody) -> Self {
        Self {
            event: "ack",
            id,
            request,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatLockedPayload {
    pub showtime_id: DbId,
    pub seat_id: DbId,
    pub session_id: String,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatUnlockedPayload {
    pub showtime_id: DbId,
    pub seat_id: DbId,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub error: String,
}

/// Server-initiated pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    SeatLocked(SeatLockedPayload),
    SeatUnlocked(SeatUnlockedPayload),
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn seat_locked(lock: &SeatLock) -> Self {
        Self::SeatLocked(SeatLockedPayload {
            showtime_id: lock.showtime_id,
            seat_id: lock.seat_id,
            session_id: lock.session_id.clone(),
            expires_at: lock.expires_at,
        })
    }

    pub fn seat_unlocked(showtime_id: DbId, seat_id: DbId, session_id: &str) -> Self {
        Self::SeatUnlocked(SeatUnlockedPayload {
            showtime_id,
            seat_id,
            session_id: session_id.to_string(),
        })
    }
}

/// Encode any frame as a text message.
pub fn text_frame<T: Serialize>(frame: &T) -> Message {
    let json = serde_json::to_string(frame).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to encode WebSocket frame");
        String::from("{}")
    });
    Message::Text(json.into())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_lock_seat_with_id() {
        let frame =
            ClientFrame::parse(r#"{"id":3,"event":"lockSeat","data":{"showtimeId":42,"seatId":7}}"#)
                .unwrap();
        assert_eq!(frame.id, Some(3));
        assert_eq!(
            frame.event,
            ClientEvent::LockSeat(SeatRef {
                showtime_id: 42,
                seat_id: 7
            })
        );
    }

    #[test]
    fn id_is_optional() {
        let frame =
            ClientFrame::parse(r#"{"event":"joinShowtime","data":{"showtimeId":42}}"#).unwrap();
        assert_eq!(frame.id, None);
        assert_matches!(frame.event, ClientEvent::JoinShowtime(ShowtimeRef { showtime_id: 42 }));
    }

    #[test]
    fn unknown_event_keeps_id() {
        let err = ClientFrame::parse(r#"{"id":9,"event":"buySeat","data":{}}"#).unwrap_err();
        assert_eq!(err.id, Some(9));
        assert!(err.message.contains("buySeat"));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let err = ClientFrame::parse(r#"{"id":1,"event":"lockSeat","data":{"showtimeId":42}}"#)
            .unwrap_err();
        assert_eq!(err.id, Some(1));
        assert!(err.message.starts_with("Invalid lockSeat payload"));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = ClientFrame::parse("hello").unwrap_err();
        assert_eq!(err.id, None);
        assert!(err.message.starts_with("Malformed frame"));
    }

    #[test]
    fn failed_ack_omits_empty_fields() {
        let body = AckBody::failed("nope");
        let json = serde_json::to_value(AckFrame::new(Some(2), UNLOCK_SEAT, &body)).unwrap();
        assert_eq!(json["event"], "ack");
        assert_eq!(json["id"], 2);
        assert_eq!(json["for"], "unlockSeat");
        assert_eq!(json["data"]["success"], false);
        assert_eq!(json["data"]["error"], "nope");
        assert!(json["data"].get("lockedSeats").is_none());
    }

    #[test]
    fn seat_unlocked_uses_event_envelope() {
        let json = serde_json::to_value(ServerEvent::seat_unlocked(42, 7, "conn-a")).unwrap();
        assert_eq!(json["event"], "seatUnlocked");
        assert_eq!(json["data"]["seatId"], 7);
        assert_eq!(json["data"]["sessionId"], "conn-a");
        assert_eq!(json["data"]["showtimeId"], 42);
    }
}
