use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{validate_name, BlobStore};
use crate::error::{RagTraceError, Result};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Process-local blob store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryBlobStore {
    buckets: RwLock<HashSet<String>>,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn bucket_exists(&self, bucket: &str) -> bool {
        self.buckets.read().await.contains(bucket)
    }

    pub async fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        validate_name("bucket", bucket)?;
        self.buckets.write().await.insert(bucket.to_string());
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<()> {
        validate_name("key", key)?;
        if !self.bucket_exists(bucket).await {
            return Err(RagTraceError::Storage(format!(
                "Bucket '{bucket}' does not exist"
            )));
        }
        self.objects.write().await.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                content_type: content_type.to_string(),
                body,
            },
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.object(bucket, key).await.map(|o| o.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_requires_bucket() {
        let store = MemoryBlobStore::new();
        assert!(store
            .put_object("embeddings", "embedding_1.json", "application/json", vec![1])
            .await
            .is_err());

        store.ensure_bucket("embeddings").await.unwrap();
        store
            .put_object("embeddings", "embedding_1.json", "application/json", vec![1])
            .await
            .unwrap();

        let stored = store.object("embeddings", "embedding_1.json").await.unwrap();
        assert_eq!(stored.content_type, "application/json");
        assert_eq!(stored.body, vec![1]);
    }
}
