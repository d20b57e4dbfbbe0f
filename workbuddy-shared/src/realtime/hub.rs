/// In-process room registry for chat fan-out
///
/// Each WebSocket connection gets a [`ConnectionId`] and an unbounded channel;
/// the socket task drains the channel into the socket. Rooms map connection
/// ids to senders, so joining the same room twice keeps one entry and each
/// subscriber receives a published event once.
///
/// Delivery is at-most-once. A sender whose receiver is gone is pruned on the
/// next publish to that room; nothing is buffered for reconnecting clients.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, trace};

use super::events::ServerEvent;

/// Identifies one WebSocket connection for its lifetime
pub type ConnectionId = u64;

/// Channel half the hub pushes events into
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

type Rooms = HashMap<String, HashMap<ConnectionId, EventSender>>;

#[derive(Debug, Default)]
pub struct RoomHub {
    rooms: RwLock<Rooms>,
    next_id: AtomicU64,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh connection id
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Subscribes a connection to a room
    ///
    /// Returns false if the connection was already in the room.
    pub async fn join(&self, room: &str, connection_id: ConnectionId, sender: EventSender) -> bool {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room.to_string()).or_default();
        let joined = members.insert(connection_id, sender).is_none();

        debug!(room, connection_id, joined, "Join room");
        joined
    }

    /// Unsubscribes a connection from a room; empty rooms are dropped
    pub async fn leave(&self, room: &str, connection_id: ConnectionId) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(room) else {
            return false;
        };

        let left = members.remove(&connection_id).is_some();
        if members.is_empty() {
            rooms.remove(room);
        }

        debug!(room, connection_id, left, "Leave room");
        left
    }

    /// Removes a connection from every room, returning how many it was in
    pub async fn disconnect(&self, connection_id: ConnectionId) -> usize {
        let mut rooms = self.rooms.write().await;
        let mut removed = 0;

        rooms.retain(|_, members| {
            if members.remove(&connection_id).is_some() {
                removed += 1;
            }
            !members.is_empty()
        });

        debug!(connection_id, rooms = removed, "Connection removed from hub");
        removed
    }

    /// Sends `event` to every connection in `room`
    ///
    /// Returns the number of connections the event was handed to. Closed
    /// connections are skipped and pruned.
    pub async fn publish(&self, room: &str, event: ServerEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let rooms = self.rooms.read().await;
            let Some(members) = rooms.get(room) else {
                trace!(room, "Publish to empty room");
                return 0;
            };

            for (connection_id, sender) in members {
                if sender.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*connection_id);
                }
            }
        }

        if !closed.is_empty() {
            let mut rooms = self.rooms.write().await;
            if let Some(members) = rooms.get_mut(room) {
                for connection_id in &closed {
                    members.remove(connection_id);
                }
                if members.is_empty() {
                    rooms.remove(room);
                }
            }
            debug!(room, pruned = closed.len(), "Pruned closed connections");
        }

        delivered
    }

    pub async fn subscriber_count(&self, room: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(room)
            .map_or(0, HashMap::len)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
