use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HallucinationCheck;

/// The prompt that opened one recorded pipeline execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i64,
    pub user_query: String,
    pub system_prompt: Option<String>,
    pub final_prompt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: i64,
    pub prompt_id: i64,
    pub vector: Vec<f32>,
    /// Opaque candidate summaries, e.g. `{"doc_id": "...", "score": 0.9}`.
    pub retrieval_candidates: Option<Vec<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRecord {
    pub id: i64,
    pub prompt_id: i64,
    pub document_id: String,
    pub similarity_score: f64,
    pub metadata: Option<serde_json::Value>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl RetrievalRecord {
    /// Evidence text used by scoring: `metadata.text` when it is a non-blank string.
    pub fn evidence_text(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("text"))
            .and_then(|t| t.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub prompt_id: i64,
    pub text: String,
    pub token_stream: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMetrics {
    pub embedding_latency_ms: Option<f64>,
    pub retrieval_latency_ms: Option<f64>,
    pub llm_latency_ms: Option<f64>,
    pub total_latency_ms: Option<f64>,
    pub embedding_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub api_cost: Option<f64>,
}

impl TelemetryMetrics {
    /// Name and value of every float field that is set, for range checks.
    pub fn float_fields(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("embedding_latency_ms", self.embedding_latency_ms),
            ("retrieval_latency_ms", self.retrieval_latency_ms),
            ("llm_latency_ms", self.llm_latency_ms),
            ("total_latency_ms", self.total_latency_ms),
            ("api_cost", self.api_cost),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: i64,
    pub prompt_id: i64,
    #[serde(flatten)]
    pub metrics: TelemetryMetrics,
    pub created_at: DateTime<Utc>,
}

/// A response together with every check recorded against it, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseWithChecks {
    #[serde(flatten)]
    pub response: ResponseRecord,
    pub hallucination_checks: Vec<HallucinationCheck>,
}

/// The full persisted graph of one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceGraph {
    pub prompt: Prompt,
    pub embedding: Option<EmbeddingRecord>,
    pub retrievals: Vec<RetrievalRecord>,
    pub responses: Vec<ResponseWithChecks>,
    pub telemetry: Option<TelemetryRecord>,
}

impl TraceGraph {
    pub fn prompt_id(&self) -> i64 {
        self.prompt.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn retrieval(metadata: Option<serde_json::Value>) -> RetrievalRecord {
        RetrievalRecord {
            id: 1,
            prompt_id: 1,
            document_id: "doc".to_string(),
            similarity_score: 0.5,
            metadata,
            position: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_evidence_text_present() {
        let r = retrieval(Some(json!({"text": "Paris is in France."})));
        assert_eq!(r.evidence_text(), Some("Paris is in France."));
    }

    #[test]
    fn test_evidence_text_skips_blank_and_non_string() {
        assert_eq!(retrieval(Some(json!({"text": "   "}))).evidence_text(), None);
        assert_eq!(retrieval(Some(json!({"text": 42}))).evidence_text(), None);
        assert_eq!(retrieval(Some(json!({"title": "x"}))).evidence_text(), None);
        assert_eq!(retrieval(None).evidence_text(), None);
    }

    #[test]
    fn test_telemetry_flattens_on_the_wire() {
        let record = TelemetryRecord {
            id: 3,
            prompt_id: 1,
            metrics: TelemetryMetrics {
                total_latency_ms: Some(12.5),
                ..Default::default()
            },
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["total_latency_ms"], json!(12.5));
        assert!(value["api_cost"].is_null());
    }
}
