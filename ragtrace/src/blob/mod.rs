//! Object storage for large trace artifacts.
//!
//! Embedding dumps, retrieval logs and response logs can be copied out of
//! the relational store into named buckets. Which artifacts move, and under
//! which key, is decided by [`offload::BlobOffloader`].

mod fs;
mod memory;
pub mod offload;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{BlobBackendKind, BlobConfig};
use crate::error::{RagTraceError, Result};

pub use fs::FilesystemBlobStore;
pub use memory::MemoryBlobStore;
pub use offload::BlobOffloader;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Minimal put/get object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the bucket if it does not exist. Idempotent.
    async fn ensure_bucket(&self, bucket: &str) -> Result<()>;
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<()>;
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>>;
}

/// The three artifact families that can be offloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Embedding,
    Retrieval,
    Response,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Retrieval => "retrieval",
            Self::Response => "response",
        }
    }

    pub fn bucket<'a>(&self, config: &'a BlobConfig) -> &'a str {
        match self {
            Self::Embedding => &config.embeddings_bucket,
            Self::Retrieval => &config.retrievals_bucket,
            Self::Response => &config.responses_bucket,
        }
    }
}

/// Object key for an artifact: `<kind>_<prompt_id>.json`.
pub fn object_key(kind: ArtifactKind, prompt_id: i64) -> String {
    format!("{}_{}.json", kind.as_str(), prompt_id)
}

/// Reject names that could escape a bucket or the store root.
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(RagTraceError::Storage(format!("Invalid {kind} name: '{name}'")));
    }
    Ok(())
}

pub fn create_blob_store(config: &BlobConfig) -> Arc<dyn BlobStore> {
    match config.backend {
        BlobBackendKind::Filesystem => Arc::new(FilesystemBlobStore::new(config.root.clone())),
        BlobBackendKind::Memory => Arc::new(MemoryBlobStore::new()),
    }
}
