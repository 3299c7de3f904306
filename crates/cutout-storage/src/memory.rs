//! In-memory object storage for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use cutout_core::error::AppError;
use cutout_core::result::AppResult;
use cutout_core::traits::storage::{ObjectMeta, ObjectStorage};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// Map-backed object store behind one mutex. Strongly consistent per key by
/// construction.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object with an explicit modification time. Lets tests stage
    /// objects of arbitrary age for cleanup runs.
    pub fn put_with_last_modified(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        last_modified: DateTime<Utc>,
    ) {
        let mut objects = self.objects.lock().expect("storage mutex poisoned");
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                last_modified,
            },
        );
    }

    /// Content type recorded for a key, if present.
    pub fn content_type_of(&self, key: &str) -> Option<String> {
        let objects = self.objects.lock().expect("storage mutex poisoned");
        objects.get(key).map(|o| o.content_type.clone())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("storage mutex poisoned").len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        self.put_with_last_modified(key, data, content_type, Utc::now());
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        let objects = self.objects.lock().expect("storage mutex poisoned");
        objects
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| AppError::storage(format!("Object '{key}' not found")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut objects = self.objects.lock().expect("storage mutex poisoned");
        objects.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        let objects = self.objects.lock().expect("storage mutex poisoned");
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectMeta {
                key: key.clone(),
                last_modified: object.last_modified,
            })
            .collect())
    }

    async fn sign(&self, key: &str, ttl_seconds: u64) -> AppResult<String> {
        let objects = self.objects.lock().expect("storage mutex poisoned");
        if !objects.contains_key(key) {
            return Err(AppError::storage(format!("Object '{key}' not found")));
        }
        Ok(format!("memory://{key}?expires={ttl_seconds}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = MemoryObjectStorage::new();
        storage
            .put("jobs/a/x.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        assert_eq!(storage.get("jobs/a/x.png").await.unwrap(), Bytes::from_static(b"png"));
        assert_eq!(storage.content_type_of("jobs/a/x.png").as_deref(), Some("image/png"));

        storage.delete("jobs/a/x.png").await.unwrap();
        assert!(storage.get("jobs/a/x.png").await.is_err());
        // Deleting a missing key is not an error.
        storage.delete("jobs/a/x.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let storage = MemoryObjectStorage::new();
        storage.put("jobs/a/1.png", Bytes::new(), "image/png").await.unwrap();
        storage.put("jobs/b/2.png", Bytes::new(), "image/png").await.unwrap();
        storage.put("other/3.png", Bytes::new(), "image/png").await.unwrap();

        let listed = storage.list("jobs/").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|m| m.key.starts_with("jobs/")));
    }
}
