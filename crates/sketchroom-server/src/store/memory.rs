//! In-memory store.

use super::{BoxFuture, RoomRecord, ShapeRecord, ShapeStore, StoreData, StoreError, StoreResult};
use serde_json::Value;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryShapeStore {
    data: RwLock<StoreData>,
}

impl MemoryShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreData>> {
        self.data.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreData>> {
        self.data.write().map_err(|_| StoreError::Poisoned)
    }
}

impl ShapeStore for MemoryShapeStore {
    fn find_room<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Option<RoomRecord>>> {
        Box::pin(async move { Ok(self.read()?.find_room(slug)) })
    }

    fn create_room<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<RoomRecord>> {
        Box::pin(async move { Ok(self.write()?.create_room(slug)) })
    }

    fn upsert_shape<'a>(
        &'a self,
        room: &'a RoomRecord,
        shape_id: &'a str,
        kind: &'a str,
        data: Value,
    ) -> BoxFuture<'a, StoreResult<ShapeRecord>> {
        Box::pin(async move { Ok(self.write()?.upsert_shape(room, shape_id, kind, data)) })
    }

    fn delete_shape<'a>(&'a self, shape_id: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move { self.write()?.delete_shape(shape_id) })
    }

    fn list_shapes<'a>(&'a self, room: &'a RoomRecord) -> BoxFuture<'a, StoreResult<Vec<ShapeRecord>>> {
        Box::pin(async move { Ok(self.read()?.list_shapes(room)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_through_trait_object() {
        let store: Box<dyn ShapeStore> = Box::new(MemoryShapeStore::new());
        assert!(store.find_room("abc").await.unwrap().is_none());
        let room = store.create_room("abc").await.unwrap();
        store
            .upsert_shape(&room, "s1", "rect", json!({"id": "s1"}))
            .await
            .unwrap();
        assert_eq!(store.list_shapes(&room).await.unwrap().len(), 1);
        store.delete_shape("s1").await.unwrap();
        assert!(matches!(
            store.delete_shape("s1").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.list_shapes(&room).await.unwrap().is_empty());
    }
}
