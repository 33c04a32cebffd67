//! Broadcast and persistence of room edits.
//!
//! A chat payload is relayed to the other room members before anything is
//! written. Persistence failures are logged; the broadcast stands.

use crate::registry::{ConnectionId, RoomRegistry};
use crate::store::{RoomRecord, ShapeStore, StoreError};
use serde_json::Value;
use sketchroom_core::protocol::{ServerMessage, ShapeEvent};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What happened to the durable state for one chat payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    Upserted,
    Deleted,
    /// Erase of a shape with no record.
    AlreadyGone,
    /// Payload was not a shape edit, or the room has no record.
    Skipped,
    Failed,
}

/// Outcome of relaying one chat payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The payload was not JSON; nothing was sent or written.
    Rejected,
    Relayed { delivered: usize, persisted: Persisted },
}

pub struct Relay {
    registry: RoomRegistry,
    store: Arc<dyn ShapeStore>,
    auto_create_rooms: bool,
}

impl Relay {
    pub fn new(store: Arc<dyn ShapeStore>, auto_create_rooms: bool) -> Self {
        Self {
            registry: RoomRegistry::new(),
            store,
            auto_create_rooms,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn ShapeStore {
        self.store.as_ref()
    }

    pub fn join(&self, slug: &str, conn: ConnectionId, outbound: mpsc::Sender<String>) {
        self.registry.join(slug, conn, outbound);
        tracing::info!(room = %slug, %conn, members = self.registry.member_count(slug), "Joined room");
    }

    pub fn disconnect(&self, conn: ConnectionId) {
        self.registry.leave_all(conn);
    }

    /// Relay `message` to the other members of `slug`, then apply it to the
    /// store.
    pub async fn chat(&self, from: ConnectionId, slug: &str, message: String) -> RelayOutcome {
        let payload: Value = match serde_json::from_str(&message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(room = %slug, conn = %from, error = %e, "Dropping malformed chat payload");
                return RelayOutcome::Rejected;
            }
        };
        let event = ShapeEvent::decode(&message);

        let frame = match (ServerMessage::Chat { message }).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode chat frame");
                return RelayOutcome::Rejected;
            }
        };
        let delivered = self.registry.broadcast_except(slug, from, &frame);

        let persisted = match event {
            Ok(event) => self.persist(slug, payload, event).await,
            Err(e) => {
                tracing::debug!(room = %slug, error = %e, "Chat payload is not a shape edit");
                Persisted::Skipped
            }
        };
        RelayOutcome::Relayed {
            delivered,
            persisted,
        }
    }

    async fn persist(&self, slug: &str, mut payload: Value, event: ShapeEvent) -> Persisted {
        let room = match self.resolve_room(slug).await {
            Ok(Some(room)) => room,
            Ok(None) => {
                tracing::info!(room = %slug, "Room not found, edit not persisted");
                return Persisted::Skipped;
            }
            Err(e) => {
                tracing::error!(room = %slug, error = %e, "Failed to resolve room");
                return Persisted::Failed;
            }
        };

        match event {
            ShapeEvent::Upsert(shape) => {
                let data = payload
                    .get_mut("shape")
                    .map(Value::take)
                    .unwrap_or(Value::Null);
                match self
                    .store
                    .upsert_shape(&room, shape.id(), shape.kind(), data)
                    .await
                {
                    Ok(_) => {
                        tracing::debug!(room = %slug, shape_id = %shape.id(), "Shape saved");
                        Persisted::Upserted
                    }
                    Err(e) => {
                        tracing::error!(room = %slug, shape_id = %shape.id(), error = %e, "Failed to save shape");
                        Persisted::Failed
                    }
                }
            }
            ShapeEvent::Erase(shape_id) => match self.store.delete_shape(&shape_id).await {
                Ok(()) => {
                    tracing::debug!(room = %slug, %shape_id, "Shape deleted");
                    Persisted::Deleted
                }
                Err(StoreError::NotFound(_)) => {
                    tracing::info!(room = %slug, %shape_id, "Shape already deleted");
                    Persisted::AlreadyGone
                }
                Err(e) => {
                    tracing::error!(room = %slug, %shape_id, error = %e, "Failed to delete shape");
                    Persisted::Failed
                }
            },
        }
    }

    async fn resolve_room(&self, slug: &str) -> Result<Option<RoomRecord>, StoreError> {
        match self.store.find_room(slug).await? {
            Some(room) => Ok(Some(room)),
            None if self.auto_create_rooms => self.store.create_room(slug).await.map(Some),
            None => Ok(None),
        }
    }

    /// Persisted shape payloads of `slug` in creation order, or `None` when
    /// the room has no record.
    pub async fn room_shapes(&self, slug: &str) -> Result<Option<Vec<Value>>, StoreError> {
        let Some(room) = self.store.find_room(slug).await? else {
            return Ok(None);
        };
        let records = self.store.list_shapes(&room).await?;
        Ok(Some(records.into_iter().map(|r| r.data).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryShapeStore;
    use sketchroom_core::shapes::{Rectangle, Shape};
    use kurbo::Point;
    use uuid::Uuid;

    fn relay(auto_create: bool) -> Relay {
        Relay::new(Arc::new(MemoryShapeStore::new()), auto_create)
    }

    fn member(relay: &Relay, slug: &str) -> (ConnectionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        let id = Uuid::new_v4();
        relay.join(slug, id, tx);
        (id, rx)
    }

    fn upsert_payload() -> (Shape, String) {
        let shape = Shape::Rectangle(Rectangle::new(Point::new(1.0, 2.0), 3.0, 4.0, "#fff"));
        let message = ShapeEvent::Upsert(shape.clone()).encode().unwrap();
        (shape, message)
    }

    #[tokio::test]
    async fn test_upsert_is_relayed_verbatim_and_saved() {
        let relay = relay(true);
        let (a, mut rx_a) = member(&relay, "abc");
        let (_b, mut rx_b) = member(&relay, "abc");
        let (shape, message) = upsert_payload();

        let outcome = relay.chat(a, "abc", message.clone()).await;
        assert_eq!(
            outcome,
            RelayOutcome::Relayed {
                delivered: 1,
                persisted: Persisted::Upserted
            }
        );
        let frame = ServerMessage::from_json(&rx_b.try_recv().unwrap()).unwrap();
        assert_eq!(frame, ServerMessage::Chat { message });
        assert!(rx_a.try_recv().is_err());

        let shapes = relay.room_shapes("abc").await.unwrap().unwrap();
        assert_eq!(shapes, vec![serde_json::to_value(&shape).unwrap()]);
    }

    #[tokio::test]
    async fn test_erase_tolerates_missing_record() {
        let relay = relay(true);
        let (a, _rx) = member(&relay, "abc");
        let (shape, message) = upsert_payload();
        relay.chat(a, "abc", message).await;

        let erase = ShapeEvent::Erase(shape.id().to_string()).encode().unwrap();
        let first = relay.chat(a, "abc", erase.clone()).await;
        let second = relay.chat(a, "abc", erase).await;
        assert_eq!(
            first,
            RelayOutcome::Relayed {
                delivered: 0,
                persisted: Persisted::Deleted
            }
        );
        assert_eq!(
            second,
            RelayOutcome::Relayed {
                delivered: 0,
                persisted: Persisted::AlreadyGone
            }
        );
        assert_eq!(relay.room_shapes("abc").await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_not_relayed() {
        let relay = relay(true);
        let (a, _rx_a) = member(&relay, "abc");
        let (_b, mut rx_b) = member(&relay, "abc");
        assert_eq!(
            relay.chat(a, "abc", "{oops".into()).await,
            RelayOutcome::Rejected
        );
        assert!(rx_b.try_recv().is_err());
        assert_eq!(relay.room_shapes("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_payload_is_relayed_not_saved() {
        let relay = relay(true);
        let (a, _rx_a) = member(&relay, "abc");
        let (_b, mut rx_b) = member(&relay, "abc");
        let outcome = relay.chat(a, "abc", r#"{"cursor":[1,2]}"#.into()).await;
        assert_eq!(
            outcome,
            RelayOutcome::Relayed {
                delivered: 1,
                persisted: Persisted::Skipped
            }
        );
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_room_without_auto_create() {
        let relay = relay(false);
        let (a, _rx_a) = member(&relay, "abc");
        let (_b, mut rx_b) = member(&relay, "abc");
        let (_, message) = upsert_payload();
        let outcome = relay.chat(a, "abc", message).await;
        assert_eq!(
            outcome,
            RelayOutcome::Relayed {
                delivered: 1,
                persisted: Persisted::Skipped
            }
        );
        assert!(rx_b.try_recv().is_ok());
        assert_eq!(relay.room_shapes("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disconnect_cleans_up_membership() {
        let relay = relay(true);
        let (a, _rx) = member(&relay, "abc");
        relay.disconnect(a);
        assert!(!relay.registry().contains_room("abc"));
    }
}
