#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use ragtrace::blob::{BlobOffloader, BlobStore, MemoryBlobStore};
use ragtrace::classifier::{EntailmentProvider, MockClassifier};
use ragtrace::config::{BlobConfig, DatabaseConfig, ScoringConfig};
use ragtrace::db::{Database, DatabaseBackend, LibSqlBackend};
use ragtrace::models::{
    EmbeddingInput, ResponseInput, RetrievalInput, TelemetryMetrics, TraceSubmission,
};
use ragtrace::scoring::{GroundednessScorer, ScoringWorker};
use ragtrace::services::{EventBus, IngestionService, QueryService};

pub const DIMENSIONS: usize = 4;

/// Services wired against a throwaway database file and an in-memory blob store.
pub struct Harness {
    pub raw_db: Database,
    pub db: Arc<dyn DatabaseBackend>,
    pub blobs: Arc<MemoryBlobStore>,
    pub events: EventBus,
    pub ingestion: IngestionService,
    pub query: QueryService,
    _dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_blob_store(None).await
    }

    /// Use `store` for offload instead of the in-memory store.
    pub async fn with_blob_store(store: Option<Arc<dyn BlobStore>>) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = dir.path().join("ragtrace_test.db");
        let raw_db = Database::new(&DatabaseConfig::local(db_path.display().to_string()))
            .await
            .expect("failed to open database");
        let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(raw_db.clone()));

        let blobs = Arc::new(MemoryBlobStore::new());
        let store = store.unwrap_or_else(|| blobs.clone() as Arc<dyn BlobStore>);
        let offloader = Arc::new(BlobOffloader::new(store, BlobConfig::default()));
        let events = EventBus::new(32);
        let ingestion =
            IngestionService::new(db.clone(), offloader, events.clone(), DIMENSIONS, true);
        let query = QueryService::new(db.clone());

        Self {
            raw_db,
            db,
            blobs,
            events,
            ingestion,
            query,
            _dir: dir,
        }
    }

    pub fn scorer(&self, mock: MockClassifier) -> GroundednessScorer {
        GroundednessScorer::new(self.db.clone(), EntailmentProvider::mock(mock))
            .with_events(self.events.clone())
    }

    pub fn worker(&self, mock: MockClassifier) -> ScoringWorker {
        ScoringWorker::new(
            self.db.clone(),
            self.scorer(mock),
            ScoringConfig {
                batch_size: 8,
                concurrency: 2,
                ..Default::default()
            },
        )
    }

    /// Row count of `table`, read straight from SQLite.
    pub async fn count(&self, table: &str) -> i64 {
        let conn = self.raw_db.connect().await.expect("connect");
        let mut rows = conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await
            .expect("count query");
        let row = rows.next().await.expect("row").expect("count row");
        row.get::<i64>(0).expect("count value")
    }
}

/// A trace whose retrievals carry `evidence` as `metadata.text`.
/// `None` entries become retrievals without a text field.
pub fn submission(response_text: &str, evidence: &[Option<&str>]) -> TraceSubmission {
    TraceSubmission {
        user_query: "Where is the Eiffel Tower?".to_string(),
        system_prompt: Some("Answer from the context only.".to_string()),
        final_prompt: "Context: ...\n\nQuestion: Where is the Eiffel Tower?".to_string(),
        embedding: EmbeddingInput {
            vector: vec![0.25, -0.5, 0.125, 1.0],
            retrieval_candidates: Some(vec![json!({"doc_id": "doc-0", "score": 0.9})]),
        },
        retrievals: evidence
            .iter()
            .enumerate()
            .map(|(i, text)| RetrievalInput {
                document_id: format!("doc-{i}"),
                similarity_score: 0.9 - i as f64 * 0.1,
                metadata: Some(match text {
                    Some(text) => json!({"text": text, "source": "wiki"}),
                    None => json!({"source": "wiki"}),
                }),
            })
            .collect(),
        response: ResponseInput {
            text: response_text.to_string(),
            token_stream: Some(vec!["The".to_string(), " Eiffel".to_string()]),
            hallucination_check: None,
        },
        telemetry: Some(TelemetryMetrics {
            embedding_latency_ms: Some(12.5),
            retrieval_latency_ms: Some(40.0),
            llm_latency_ms: Some(610.25),
            total_latency_ms: Some(662.75),
            embedding_tokens: Some(9),
            completion_tokens: Some(14),
            api_cost: Some(0.0021),
        }),
        ..Default::default()
    }
}
