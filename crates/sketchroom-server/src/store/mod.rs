//! Durable rooms and shape records.
//!
//! Shape records are keyed by the shape's own identity across all rooms.
//! Writing an existing identity replaces its payload and keeps its room,
//! kind and creation time, so records list in first-write order.

mod file;
mod memory;

pub use file::FileShapeStore;
pub use memory::MemoryShapeStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("shape {0} not found")]
    NotFound(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub id: Uuid,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub room_id: Uuid,
    /// The shape as sent on the wire.
    pub data: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future returned by store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence backend for rooms and shapes.
pub trait ShapeStore: Send + Sync {
    fn find_room<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Option<RoomRecord>>>;

    /// Create a room record, or return the existing one for `slug`.
    fn create_room<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<RoomRecord>>;

    /// Create or replace the record for `shape_id`.
    fn upsert_shape<'a>(
        &'a self,
        room: &'a RoomRecord,
        shape_id: &'a str,
        kind: &'a str,
        data: Value,
    ) -> BoxFuture<'a, StoreResult<ShapeRecord>>;

    /// Delete the record for `shape_id`; [`StoreError::NotFound`] when absent.
    fn delete_shape<'a>(&'a self, shape_id: &'a str) -> BoxFuture<'a, StoreResult<()>>;

    /// Records of `room` in creation order.
    fn list_shapes<'a>(&'a self, room: &'a RoomRecord) -> BoxFuture<'a, StoreResult<Vec<ShapeRecord>>>;
}

/// Store contents shared by the backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    rooms: Vec<RoomRecord>,
    shapes: Vec<ShapeRecord>,
}

impl StoreData {
    fn find_room(&self, slug: &str) -> Option<RoomRecord> {
        self.rooms.iter().find(|r| r.slug == slug).cloned()
    }

    fn create_room(&mut self, slug: &str) -> RoomRecord {
        if let Some(existing) = self.find_room(slug) {
            return existing;
        }
        let room = RoomRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.rooms.push(room.clone());
        room
    }

    fn upsert_shape(&mut self, room: &RoomRecord, shape_id: &str, kind: &str, data: Value) -> ShapeRecord {
        if let Some(existing) = self.shapes.iter_mut().find(|s| s.id == shape_id) {
            existing.data = data;
            return existing.clone();
        }
        let record = ShapeRecord {
            id: shape_id.to_string(),
            kind: kind.to_string(),
            room_id: room.id,
            data,
            created_at: OffsetDateTime::now_utc(),
        };
        self.shapes.push(record.clone());
        record
    }

    fn delete_shape(&mut self, shape_id: &str) -> StoreResult<()> {
        let index = self
            .shapes
            .iter()
            .position(|s| s.id == shape_id)
            .ok_or_else(|| StoreError::NotFound(shape_id.to_string()))?;
        self.shapes.remove(index);
        Ok(())
    }

    fn list_shapes(&self, room: &RoomRecord) -> Vec<ShapeRecord> {
        let mut shapes: Vec<_> = self
            .shapes
            .iter()
            .filter(|s| s.room_id == room.id)
            .cloned()
            .collect();
        shapes.sort_by_key(|s| s.created_at);
        shapes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upsert_replaces_payload_only() {
        let mut data = StoreData::default();
        let a = data.create_room("a");
        let b = data.create_room("b");
        let first = data.upsert_shape(&a, "s1", "rect", json!({"x": 1}));
        let second = data.upsert_shape(&b, "s1", "ellipse", json!({"x": 2}));

        assert_eq!(second.room_id, a.id);
        assert_eq!(second.kind, "rect");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.data, json!({"x": 2}));
        assert_eq!(data.shapes.len(), 1);
        assert!(data.list_shapes(&b).is_empty());
    }

    #[test]
    fn test_create_room_is_idempotent() {
        let mut data = StoreData::default();
        let first = data.create_room("abc");
        assert_eq!(data.create_room("abc"), first);
        assert_eq!(data.rooms.len(), 1);
        assert_eq!(data.find_room("abc"), Some(first));
        assert_eq!(data.find_room("xyz"), None);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut data = StoreData::default();
        let room = data.create_room("abc");
        data.upsert_shape(&room, "s1", "rect", json!({}));
        data.delete_shape("s1").unwrap();
        assert!(matches!(data.delete_shape("s1"), Err(StoreError::NotFound(id)) if id == "s1"));
    }

    #[test]
    fn test_list_in_creation_order() {
        let mut data = StoreData::default();
        let room = data.create_room("abc");
        for id in ["s1", "s2", "s3"] {
            data.upsert_shape(&room, id, "rect", json!({ "id": id }));
        }
        data.upsert_shape(&room, "s1", "rect", json!({ "id": "s1", "x": 5 }));
        let ids: Vec<_> = data.list_shapes(&room).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["s1", "s2", "s3"]);
    }

    #[test]
    fn test_record_json_layout() {
        let mut data = StoreData::default();
        let room = data.create_room("abc");
        let record = data.upsert_shape(&room, "s1", "rect", json!({"type": "rect"}));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "rect");
        assert_eq!(value["roomId"], json!(room.id));
        assert!(value["createdAt"].is_string());
        let back: ShapeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
