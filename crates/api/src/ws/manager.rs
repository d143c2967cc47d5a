use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use cinebook_core::types::DbId;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// Showtime rooms this connection has joined.
    pub rooms: HashSet<DbId>,
}

/// Manages all active WebSocket connections and their showtime rooms.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Room membership lives on the connection,
/// so removing a connection drops it from every room at once.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            sender: tx,
            rooms: HashSet::new(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Add a connection to a showtime room. Returns `false` for an unknown
    /// connection.
    pub async fn join_room(&self, conn_id: &str, showtime_id: DbId) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => {
                conn.rooms.insert(showtime_id);
                true
            }
            None => false,
        }
    }

    /// Remove a connection from a showtime room. Returns whether it was a
    /// member.
    pub async fn leave_room(&self, conn_id: &str, showtime_id: DbId) -> bool {
        self.connections
            .write()
            .await
            .get_mut(conn_id)
            .is_some_and(|conn| conn.rooms.remove(&showtime_id))
    }

    /// Connection IDs currently in a showtime room.
    pub async fn room_members(&self, showtime_id: DbId) -> Vec<String> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, conn)| conn.rooms.contains(&showtime_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Send a message to one connection. Returns `false` when the connection
    /// is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Send a message to every member of a showtime room, optionally
    /// skipping one connection.
    ///
    /// Returns the number of connections the message was sent to.
    pub async fn broadcast_to_room(
        &self,
        showtime_id: DbId,
        message: Message,
        except: Option<&str>,
    ) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for (id, conn) in conns.iter() {
            if !conn.rooms.contains(&showtime_id) || except == Some(id.as_str()) {
                continue;
            }
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
