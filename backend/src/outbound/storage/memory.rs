//! Process-local object store.
//!
//! Presigned URLs use a `memory://` scheme and are never dereferenced;
//! tests simulate a client upload with [`InMemoryObjectStore::insert`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{ObjectMetadata, ObjectStore, ObjectStoreError, PresignedUpload};

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// In-memory [`ObjectStore`]; clones share the same objects.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    fail_copies: Arc<AtomicBool>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object directly, as a client holding a presigned URL would.
    pub async fn insert(&self, key: &str, content_type: &str, bytes: Vec<u8>) {
        self.objects.lock().await.insert(
            key.to_owned(),
            StoredObject {
                content_type: Some(content_type.to_owned()),
                bytes,
            },
        );
    }

    /// Make every subsequent `copy` fail with an operation error.
    pub fn fail_copies(&self, fail: bool) {
        self.fail_copies.store(fail, Ordering::SeqCst);
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.lock().await.contains_key(key)
    }

    /// Keys under `prefix`, in lexical order.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.objects
            .lock()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUpload, ObjectStoreError> {
        Ok(PresignedUpload {
            url: format!(
                "memory://{key}?content-type={content_type}&expires-in={}",
                ttl.as_secs()
            ),
        })
    }

    async fn put(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), ObjectStoreError> {
        self.insert(key, content_type, body).await;
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMetadata>, ObjectStoreError> {
        let objects = self.objects.lock().await;
        Ok(objects.get(key).map(|object| ObjectMetadata {
            size_bytes: object.bytes.len() as u64,
            content_type: object.content_type.clone(),
        }))
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        if self.fail_copies.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::operation(format!(
                "copy {from} -> {to} refused"
            )));
        }
        let mut objects = self.objects.lock().await;
        let source = objects
            .get(from)
            .cloned()
            .ok_or_else(|| ObjectStoreError::not_found(from))?;
        objects.insert(to.to_owned(), source);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<(), ObjectStoreError> {
        let mut objects = self.objects.lock().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Behaviour of the in-memory store relied on by workflow tests.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn copy_duplicates_bytes_and_metadata() {
        let store = InMemoryObjectStore::new();
        store.insert("uploads/a.png", "image/png", vec![1, 2, 3]).await;

        store
            .copy("uploads/a.png", "photos/a.png")
            .await
            .expect("copy succeeds");

        let head = store.head("photos/a.png").await.expect("head");
        assert_eq!(
            head,
            Some(ObjectMetadata {
                size_bytes: 3,
                content_type: Some("image/png".to_owned()),
            })
        );
        assert!(store.contains("uploads/a.png").await);
    }

    #[rstest]
    #[tokio::test]
    async fn copy_of_missing_source_is_not_found() {
        let store = InMemoryObjectStore::new();
        let err = store.copy("nope", "dest").await.expect_err("missing");
        assert_eq!(err, ObjectStoreError::not_found("nope"));
    }

    #[rstest]
    #[tokio::test]
    async fn injected_copy_failures_leave_destination_absent() {
        let store = InMemoryObjectStore::new();
        store.insert("uploads/a.jpg", "image/jpeg", vec![9]).await;
        store.fail_copies(true);

        assert!(store.copy("uploads/a.jpg", "photos/a.jpg").await.is_err());
        assert!(!store.contains("photos/a.jpg").await);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_many_ignores_unknown_keys() {
        let store = InMemoryObjectStore::new();
        store.insert("photos/x/1.jpg", "image/jpeg", vec![1]).await;
        store
            .delete_many(&["photos/x/1.jpg".to_owned(), "photos/x/2.jpg".to_owned()])
            .await
            .expect("delete");
        assert!(store.keys_with_prefix("photos/").await.is_empty());
    }
}
