use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{validate_name, BlobStore};
use crate::error::{RagTraceError, Result};

/// Buckets are directories under `root`, objects are files inside them.
pub struct FilesystemBlobStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FilesystemBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        validate_name("bucket", bucket)?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_name("key", key)?;
        Ok(self.bucket_dir(bucket)?.join(key))
    }
}

fn storage_err(action: &str, path: &Path, error: std::io::Error) -> RagTraceError {
    RagTraceError::Storage(format!("Failed to {action} {}: {error}", path.display()))
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        let dir = self.bucket_dir(bucket)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_err("create bucket", &dir, e))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        _content_type: &str,
        body: Vec<u8>,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        let seq = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp_path = path.with_extension(format!("tmp-{}-{seq}", std::process::id()));

        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| storage_err("create temp file", &tmp_path, e))?;
        file.write_all(&body)
            .await
            .map_err(|e| storage_err("write temp file", &tmp_path, e))?;
        file.sync_all().await.ok();
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(storage_err("move object into place at", &path, e));
        }
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err("read object", &path, e)),
        }
    }
}
