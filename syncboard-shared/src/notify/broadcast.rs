/// Room-based in-process broadcast hub
///
/// Real-time delivery runs over named rooms backed by tokio broadcast
/// channels. Two room families exist:
///
/// - `project:{id}` carries project activity to every open project
///   board socket
/// - `user:{id}` carries notification payloads to a user's open
///   notification sockets
///
/// Channels are created lazily on first subscribe or publish and
/// dropped again once the last receiver disconnects. Publishing to a
/// room with no subscribers is a no-op, never an error.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Default buffered messages per room channel
const DEFAULT_CAPACITY: usize = 256;

/// Returns the room name for a project board
pub fn project_room(project_id: Uuid) -> String {
    format!("project:{project_id}")
}

/// Returns the room name for a user's notification stream
pub fn user_room(user_id: Uuid) -> String {
    format!("user:{user_id}")
}

/// In-process pub/sub hub keyed by room name
///
/// Messages are pre-serialized JSON strings; the hub does not inspect
/// them. Slow subscribers that fall more than the channel capacity
/// behind lose the oldest messages (broadcast channel lag semantics).
pub struct BroadcastHub {
    capacity: usize,
    rooms: RwLock<HashMap<String, broadcast::Sender<String>>>,
}

impl BroadcastHub {
    /// Creates a hub with the default per-room capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a hub with an explicit per-room channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to a room, creating its channel if needed
    ///
    /// The subscription ends when the returned receiver is dropped;
    /// the room itself is cleaned up on the next publish that finds it
    /// without receivers.
    pub async fn subscribe(&self, room: &str) -> broadcast::Receiver<String> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publishes a message to a room
    ///
    /// Returns the number of receivers the message was delivered to.
    /// A room with no subscribers swallows the message and returns 0.
    pub async fn publish(&self, room: &str, message: String) -> usize {
        let sender = {
            let rooms = self.rooms.read().await;
            rooms.get(room).cloned()
        };

        let Some(sender) = sender else {
            return 0;
        };

        match sender.send(message) {
            Ok(delivered) => delivered,
            Err(_) => {
                // Last receiver is gone; drop the room unless someone
                // resubscribed between the send and this cleanup.
                let mut rooms = self.rooms.write().await;
                if rooms.get(room).is_some_and(|s| s.receiver_count() == 0) {
                    rooms.remove(room);
                }
                0
            }
        }
    }

    /// Returns the number of live subscribers in a room
    pub async fn subscriber_count(&self, room: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room).map_or(0, |s| s.receiver_count())
    }

    /// Returns the number of rooms currently held
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
