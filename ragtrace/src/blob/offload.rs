use std::sync::Arc;

use serde_json::json;

use super::{object_key, ArtifactKind, BlobStore, JSON_CONTENT_TYPE};
use crate::config::BlobConfig;
use crate::error::Result;
use crate::models::{TraceGraph, TraceSubmission};

/// Which artifacts of a trace were requested for offload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffloadFlags {
    pub embedding: bool,
    pub retrievals: bool,
    pub response: bool,
}

impl OffloadFlags {
    pub fn any(&self) -> bool {
        self.embedding || self.retrievals || self.response
    }
}

impl From<&TraceSubmission> for OffloadFlags {
    fn from(submission: &TraceSubmission) -> Self {
        Self {
            embedding: submission.store_embedding_dump,
            retrievals: submission.store_retrieval_logs,
            response: submission.store_response_logs,
        }
    }
}

/// Copies opted-in artifacts of a committed trace to the blob store.
pub struct BlobOffloader {
    store: Arc<dyn BlobStore>,
    config: BlobConfig,
}

impl BlobOffloader {
    pub fn new(store: Arc<dyn BlobStore>, config: BlobConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Write each requested artifact. Failures never propagate; each one is
    /// logged and returned as a warning string.
    pub async fn offload(&self, flags: OffloadFlags, trace: &TraceGraph) -> Vec<String> {
        let mut warnings = Vec::new();
        let requested = [
            (flags.embedding, ArtifactKind::Embedding),
            (flags.retrievals, ArtifactKind::Retrieval),
            (flags.response, ArtifactKind::Response),
        ];

        for (enabled, kind) in requested {
            if !enabled {
                continue;
            }
            let bucket = kind.bucket(&self.config);
            let key = object_key(kind, trace.prompt_id());

            if let Err(e) = self.write_artifact(kind, bucket, &key, trace).await {
                tracing::warn!(
                    prompt_id = trace.prompt_id(),
                    bucket = %bucket,
                    key = %key,
                    error = %e,
                    "Blob offload failed"
                );
                warnings.push(format!("{} offload to {bucket}/{key} failed: {e}", kind.as_str()));
            }
        }

        warnings
    }

    async fn write_artifact(
        &self,
        kind: ArtifactKind,
        bucket: &str,
        key: &str,
        trace: &TraceGraph,
    ) -> Result<()> {
        let payload = artifact_payload(kind, trace);
        let body = serde_json::to_vec(&payload)?;

        self.store.ensure_bucket(bucket).await?;
        self.store
            .put_object(bucket, key, JSON_CONTENT_TYPE, body)
            .await?;

        tracing::debug!(bucket = %bucket, key = %key, "Offloaded artifact");
        Ok(())
    }
}

/// JSON document written for one artifact family.
pub fn artifact_payload(kind: ArtifactKind, trace: &TraceGraph) -> serde_json::Value {
    match kind {
        ArtifactKind::Embedding => {
            let (vector, candidates) = trace
                .embedding
                .as_ref()
                .map(|e| (e.vector.clone(), e.retrieval_candidates.clone()))
                .unwrap_or_default();
            json!({
                "prompt_id": trace.prompt_id(),
                "vector": vector,
                "retrieval_candidates": candidates,
            })
        }
        ArtifactKind::Retrieval => serde_json::Value::Array(
            trace
                .retrievals
                .iter()
                .map(|r| {
                    json!({
                        "document_id": r.document_id,
                        "similarity_score": r.similarity_score,
                        "metadata": r.metadata,
                    })
                })
                .collect(),
        ),
        ArtifactKind::Response => {
            let response = trace.responses.first();
            json!({
                "prompt_id": trace.prompt_id(),
                "text": response.map(|r| r.response.text.as_str()),
                "token_stream": response.and_then(|r| r.response.token_stream.as_ref()),
                "hallucination_check": response.and_then(|r| r.hallucination_checks.first()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::models::{
        EmbeddingRecord, HallucinationCheck, Prompt, ResponseRecord, ResponseWithChecks,
        RetrievalRecord,
    };
    use async_trait::async_trait;
    use chrono::Utc;

    fn trace() -> TraceGraph {
        let now = Utc::now();
        TraceGraph {
            prompt: Prompt {
                id: 5,
                user_query: "q".to_string(),
                system_prompt: None,
                final_prompt: "p".to_string(),
                created_at: now,
            },
            embedding: Some(EmbeddingRecord {
                id: 1,
                prompt_id: 5,
                vector: vec![1.0, 2.0],
                retrieval_candidates: None,
                created_at: now,
            }),
            retrievals: vec![RetrievalRecord {
                id: 1,
                prompt_id: 5,
                document_id: "d1".to_string(),
                similarity_score: 0.5,
                metadata: Some(json!({"text": "t"})),
                position: 0,
                created_at: now,
            }],
            responses: vec![ResponseWithChecks {
                response: ResponseRecord {
                    id: 9,
                    prompt_id: 5,
                    text: "Answer.".to_string(),
                    token_stream: Some(vec!["Answer".to_string(), ".".to_string()]),
                    created_at: now,
                },
                hallucination_checks: vec![HallucinationCheck {
                    id: 1,
                    response_id: 9,
                    groundedness_score: 0.75,
                    unsupported_sentences: vec![],
                    entailment_results: vec![],
                    checked_at: now,
                }],
            }],
            telemetry: None,
        }
    }

    #[tokio::test]
    async fn test_only_requested_artifacts_written() {
        let store = Arc::new(MemoryBlobStore::new());
        let offloader = BlobOffloader::new(store.clone(), BlobConfig::default());
        let flags = OffloadFlags {
            response: true,
            ..Default::default()
        };

        let warnings = offloader.offload(flags, &trace()).await;
        assert!(warnings.is_empty());
        assert_eq!(store.object_count().await, 1);
        assert!(store.bucket_exists("responses").await);
        assert!(!store.bucket_exists("embeddings").await);

        let object = store.object("responses", "response_5.json").await.unwrap();
        assert_eq!(object.content_type, "application/json");
        let payload: serde_json::Value = serde_json::from_slice(&object.body).unwrap();
        assert_eq!(payload["text"], "Answer.");
        assert_eq!(payload["token_stream"], json!(["Answer", "."]));
        assert_eq!(payload["hallucination_check"]["groundedness_score"], 0.75);
    }

    #[test]
    fn test_retrieval_payload_keeps_order() {
        let payload = artifact_payload(ArtifactKind::Retrieval, &trace());
        assert_eq!(payload[0]["document_id"], "d1");
        assert_eq!(payload[0]["metadata"]["text"], "t");
    }

    struct BrokenStore;

    #[async_trait]
    impl BlobStore for BrokenStore {
        async fn ensure_bucket(&self, _bucket: &str) -> Result<()> {
            Err(crate::error::RagTraceError::Storage("unreachable".to_string()))
        }
        async fn put_object(&self, _: &str, _: &str, _: &str, _: Vec<u8>) -> Result<()> {
            Ok(())
        }
        async fn get_object(&self, _: &str, _: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_failures_become_warnings() {
        let offloader = BlobOffloader::new(Arc::new(BrokenStore), BlobConfig::default());
        let flags = OffloadFlags {
            embedding: true,
            retrievals: true,
            response: false,
        };
        let warnings = offloader.offload(flags, &trace()).await;
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("embeddings/embedding_5.json"));
    }
}
