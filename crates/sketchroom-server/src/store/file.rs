//! JSON document store on the local filesystem.

use super::{BoxFuture, RoomRecord, ShapeRecord, ShapeStore, StoreData, StoreResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const STORE_FILE: &str = "sketchroom.json";

/// Store persisted as one JSON document in a data directory.
///
/// Every mutation is applied to a copy, written to a temporary file and
/// renamed over the document; the in-memory state only changes once the
/// write succeeded.
#[derive(Debug)]
pub struct FileShapeStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl FileShapeStore {
    /// Open the store in `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(STORE_FILE);
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), "Opened shape store");
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, data: &StoreData) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply `f` to a copy of the data, persist it, then commit it.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreData) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self.data.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }
}

impl ShapeStore for FileShapeStore {
    fn find_room<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<Option<RoomRecord>>> {
        Box::pin(async move { Ok(self.data.lock().await.find_room(slug)) })
    }

    fn create_room<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, StoreResult<RoomRecord>> {
        Box::pin(async move {
            if let Some(room) = self.data.lock().await.find_room(slug) {
                return Ok(room);
            }
            self.mutate(|data| Ok(data.create_room(slug))).await
        })
    }

    fn upsert_shape<'a>(
        &'a self,
        room: &'a RoomRecord,
        shape_id: &'a str,
        kind: &'a str,
        data: Value,
    ) -> BoxFuture<'a, StoreResult<ShapeRecord>> {
        Box::pin(async move {
            self.mutate(|store| Ok(store.upsert_shape(room, shape_id, kind, data)))
                .await
        })
    }

    fn delete_shape<'a>(&'a self, shape_id: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move { self.mutate(|data| data.delete_shape(shape_id)).await })
    }

    fn list_shapes<'a>(&'a self, room: &'a RoomRecord) -> BoxFuture<'a, StoreResult<Vec<ShapeRecord>>> {
        Box::pin(async move { Ok(self.data.lock().await.list_shapes(room)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_contents_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let store = FileShapeStore::open(dir.path()).await.unwrap();
        let room = store.create_room("abc").await.unwrap();
        store
            .upsert_shape(&room, "s1", "rect", json!({"id": "s1", "x": 1}))
            .await
            .unwrap();
        store
            .upsert_shape(&room, "s2", "ellipse", json!({"id": "s2"}))
            .await
            .unwrap();
        store.delete_shape("s2").await.unwrap();
        drop(store);

        let reopened = FileShapeStore::open(dir.path()).await.unwrap();
        let room_again = reopened.find_room("abc").await.unwrap().unwrap();
        assert_eq!(room_again, room);
        let shapes = reopened.list_shapes(&room).await.unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].data, json!({"id": "s1", "x": 1}));
        assert!(!dir.path().join("sketchroom.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_document_untouched() {
        let dir = TempDir::new().unwrap();
        let store = FileShapeStore::open(dir.path().join("nested")).await.unwrap();
        assert!(matches!(
            store.delete_shape("missing").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_malformed_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), b"{not json").unwrap();
        assert!(matches!(
            FileShapeStore::open(dir.path()).await,
            Err(StoreError::Serialization(_))
        ));
    }
}
