//! In-memory room membership.
//!
//! Rooms exist only while they have members. Each member is represented by
//! the sending half of its connection's outbound queue.

use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

pub type ConnectionId = Uuid;

#[derive(Default)]
struct Room {
    members: HashMap<ConnectionId, mpsc::Sender<String>>,
}

/// Live rooms keyed by slug.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room, creating the room if needed. A connection
    /// may belong to several rooms.
    pub fn join(&self, slug: &str, conn: ConnectionId, outbound: mpsc::Sender<String>) {
        self.rooms
            .entry(slug.to_string())
            .or_default()
            .members
            .insert(conn, outbound);
    }

    /// Remove a connection from every room and drop rooms left empty.
    pub fn leave_all(&self, conn: ConnectionId) {
        for mut room in self.rooms.iter_mut() {
            room.members.remove(&conn);
        }
        self.rooms.retain(|_, room| !room.members.is_empty());
    }

    /// Queue `frame` for every member of `slug` except `from`. Returns the
    /// number of members it was queued for.
    pub fn broadcast_except(&self, slug: &str, from: ConnectionId, frame: &str) -> usize {
        let Some(room) = self.rooms.get(slug) else {
            return 0;
        };
        let mut delivered = 0;
        for (id, outbound) in room.members.iter().filter(|(id, _)| **id != from) {
            match outbound.try_send(frame.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(room = %slug, conn = %id, "Outbound queue full, dropping frame");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(room = %slug, conn = %id, "Outbound queue closed");
                }
            }
        }
        delivered
    }

    pub fn member_count(&self, slug: &str) -> usize {
        self.rooms.get(slug).map_or(0, |room| room.members.len())
    }

    pub fn contains_room(&self, slug: &str) -> bool {
        self.rooms.contains_key(slug)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
