//! Trace request/response DTOs for the v1 API.
//!
//! Field names are snake_case on the wire, matching what instrumentation
//! clients already send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checks::{HallucinationCheckInput, HallucinationCheckResponse};
use super::common::Metadata;
use crate::models;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct EmbeddingPayload {
    /// Embedding vector. May be empty; otherwise its length must equal the
    /// configured dimension.
    pub vector: Vec<f32>,
    /// Candidate summaries such as `{"doc_id": "...", "score": 0.8}`.
    #[schema(value_type = Option<Vec<Object>>)]
    pub retrieval_candidates: Option<Vec<Metadata>>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RetrievalPayload {
    pub document_id: String,
    pub similarity_score: f64,
    /// Arbitrary metadata. A string `text` field is used as scoring evidence.
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct ResponsePayload {
    /// Response text. Required, may be empty.
    pub text: String,
    pub token_stream: Option<Vec<String>>,
    pub hallucination_check: Option<HallucinationCheckInput>,
}

/// Latency, token and cost figures. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TelemetryDto {
    pub embedding_latency_ms: Option<f64>,
    pub retrieval_latency_ms: Option<f64>,
    pub llm_latency_ms: Option<f64>,
    pub total_latency_ms: Option<f64>,
    pub embedding_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub api_cost: Option<f64>,
}

impl From<TelemetryDto> for models::TelemetryMetrics {
    fn from(t: TelemetryDto) -> Self {
        Self {
            embedding_latency_ms: t.embedding_latency_ms,
            retrieval_latency_ms: t.retrieval_latency_ms,
            llm_latency_ms: t.llm_latency_ms,
            total_latency_ms: t.total_latency_ms,
            embedding_tokens: t.embedding_tokens,
            completion_tokens: t.completion_tokens,
            api_cost: t.api_cost,
        }
    }
}

impl From<models::TelemetryMetrics> for TelemetryDto {
    fn from(m: models::TelemetryMetrics) -> Self {
        Self {
            embedding_latency_ms: m.embedding_latency_ms,
            retrieval_latency_ms: m.retrieval_latency_ms,
            llm_latency_ms: m.llm_latency_ms,
            total_latency_ms: m.total_latency_ms,
            embedding_tokens: m.embedding_tokens,
            completion_tokens: m.completion_tokens,
            api_cost: m.api_cost,
        }
    }
}

/// Request body for `POST /v1/traces`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct CreateTraceRequest {
    pub user_query: String,
    pub system_prompt: Option<String>,
    pub final_prompt: String,
    pub embedding: EmbeddingPayload,
    #[serde(default)]
    pub retrievals: Vec<RetrievalPayload>,
    pub response: ResponsePayload,
    pub telemetry: Option<TelemetryDto>,
    /// Copy the embedding to the `embeddings` bucket.
    #[serde(default)]
    pub store_embedding_dump: bool,
    /// Copy the retrieval list to the `retrievals` bucket.
    #[serde(default)]
    pub store_retrieval_logs: bool,
    /// Copy the response text, token stream and pre-seeded check to the
    /// `responses` bucket.
    #[serde(default)]
    pub store_response_logs: bool,
}

impl From<CreateTraceRequest> for models::TraceSubmission {
    fn from(req: CreateTraceRequest) -> Self {
        Self {
            user_query: req.user_query,
            system_prompt: req.system_prompt,
            final_prompt: req.final_prompt,
            embedding: models::EmbeddingInput {
                vector: req.embedding.vector,
                retrieval_candidates: req.embedding.retrieval_candidates,
            },
            retrievals: req
                .retrievals
                .into_iter()
                .map(|r| models::RetrievalInput {
                    document_id: r.document_id,
                    similarity_score: r.similarity_score,
                    metadata: r.metadata,
                })
                .collect(),
            response: models::ResponseInput {
                text: req.response.text,
                token_stream: req.response.token_stream,
                hallucination_check: req.response.hallucination_check.map(Into::into),
            },
            telemetry: req.telemetry.map(Into::into),
            store_embedding_dump: req.store_embedding_dump,
            store_retrieval_logs: req.store_retrieval_logs,
            store_response_logs: req.store_response_logs,
        }
    }
}

/// Query parameters for `GET /v1/traces`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct ListTracesQuery {
    /// Page size (default 20, max 100).
    pub limit: Option<u32>,
    /// Number of traces to skip, newest first.
    pub offset: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PromptResponse {
    pub id: i64,
    pub user_query: String,
    pub system_prompt: Option<String>,
    pub final_prompt: String,
    pub created_at: DateTime<Utc>,
}

impl From<models::Prompt> for PromptResponse {
    fn from(p: models::Prompt) -> Self {
        Self {
            id: p.id,
            user_query: p.user_query,
            system_prompt: p.system_prompt,
            final_prompt: p.final_prompt,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EmbeddingResponse {
    pub id: i64,
    pub prompt_id: i64,
    pub vector: Vec<f32>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub retrieval_candidates: Option<Vec<Metadata>>,
    pub created_at: DateTime<Utc>,
}

impl From<models::EmbeddingRecord> for EmbeddingResponse {
    fn from(e: models::EmbeddingRecord) -> Self {
        Self {
            id: e.id,
            prompt_id: e.prompt_id,
            vector: e.vector,
            retrieval_candidates: e.retrieval_candidates,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RetrievalResponse {
    pub id: i64,
    pub prompt_id: i64,
    pub document_id: String,
    pub similarity_score: f64,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl From<models::RetrievalRecord> for RetrievalResponse {
    fn from(r: models::RetrievalRecord) -> Self {
        Self {
            id: r.id,
            prompt_id: r.prompt_id,
            document_id: r.document_id,
            similarity_score: r.similarity_score,
            metadata: r.metadata,
            position: r.position,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ResponseRecordResponse {
    pub id: i64,
    pub prompt_id: i64,
    pub text: String,
    pub token_stream: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    /// Oldest first.
    pub hallucination_checks: Vec<HallucinationCheckResponse>,
}

impl From<models::ResponseWithChecks> for ResponseRecordResponse {
    fn from(r: models::ResponseWithChecks) -> Self {
        Self {
            id: r.response.id,
            prompt_id: r.response.prompt_id,
            text: r.response.text,
            token_stream: r.response.token_stream,
            created_at: r.response.created_at,
            hallucination_checks: r.hallucination_checks.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TelemetryResponse {
    pub id: i64,
    pub prompt_id: i64,
    #[serde(flatten)]
    pub metrics: TelemetryDto,
    pub created_at: DateTime<Utc>,
}

impl From<models::TelemetryRecord> for TelemetryResponse {
    fn from(t: models::TelemetryRecord) -> Self {
        Self {
            id: t.id,
            prompt_id: t.prompt_id,
            metrics: t.metrics.into(),
            created_at: t.created_at,
        }
    }
}

/// A stored trace graph.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TraceResponse {
    pub prompt: PromptResponse,
    pub embedding: Option<EmbeddingResponse>,
    /// In submission order.
    pub retrievals: Vec<RetrievalResponse>,
    pub responses: Vec<ResponseRecordResponse>,
    pub telemetry: Option<TelemetryResponse>,
}

impl From<models::TraceGraph> for TraceResponse {
    fn from(g: models::TraceGraph) -> Self {
        Self {
            prompt: g.prompt.into(),
            embedding: g.embedding.map(Into::into),
            retrievals: g.retrievals.into_iter().map(Into::into).collect(),
            responses: g.responses.into_iter().map(Into::into).collect(),
            telemetry: g.telemetry.map(Into::into),
        }
    }
}

/// Response for `POST /v1/traces`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CreateTraceResponse {
    pub trace: TraceResponse,
    /// Job queued for the new response, if any.
    pub scoring_job_id: Option<i64>,
    /// Blob offload failures. The trace itself was stored.
    pub offload_warnings: Vec<String>,
}

impl From<models::IngestionOutcome> for CreateTraceResponse {
    fn from(outcome: models::IngestionOutcome) -> Self {
        Self {
            trace: outcome.trace.into(),
            scoring_job_id: outcome.scoring_job_id,
            offload_warnings: outcome.offload_warnings,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DeleteTraceResponse {
    pub prompt_id: i64,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn create_request_defaults_flags_and_retrievals() {
        let body = json!({
            "user_query": "Where is the Eiffel Tower?",
            "final_prompt": "Answer: Where is the Eiffel Tower?",
            "embedding": {"vector": []},
            "response": {"text": "It is in Paris."}
        });
        let req: CreateTraceRequest = serde_json::from_value(body).expect("deserialize");
        let submission = models::TraceSubmission::from(req);

        assert!(submission.retrievals.is_empty());
        assert!(!submission.store_embedding_dump);
        assert!(!submission.store_retrieval_logs);
        assert!(!submission.store_response_logs);
        assert_eq!(submission.telemetry, None);
        assert_eq!(submission.response.text, "It is in Paris.");
    }

    #[test]
    fn create_request_carries_nested_fields() {
        let body = json!({
            "user_query": "q",
            "system_prompt": "be brief",
            "final_prompt": "p",
            "embedding": {"vector": [0.1, 0.2], "retrieval_candidates": [{"doc_id": "d1", "score": 0.8}]},
            "retrievals": [
                {"document_id": "d1", "similarity_score": 0.8, "metadata": {"text": "evidence"}}
            ],
            "response": {
                "text": "answer",
                "token_stream": ["ans", "wer"],
                "hallucination_check": {"groundedness_score": 1.0}
            },
            "telemetry": {"llm_latency_ms": 120.5, "completion_tokens": 3},
            "store_response_logs": true
        });
        let req: CreateTraceRequest = serde_json::from_value(body).expect("deserialize");
        let submission = models::TraceSubmission::from(req);

        assert_eq!(submission.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(submission.embedding.vector, vec![0.1, 0.2]);
        assert_eq!(submission.retrievals[0].metadata, Some(json!({"text": "evidence"})));
        assert_eq!(
            submission.response.token_stream,
            Some(vec!["ans".to_string(), "wer".to_string()])
        );
        assert_eq!(
            submission
                .response
                .hallucination_check
                .map(|c| c.groundedness_score),
            Some(1.0)
        );
        let telemetry = submission.telemetry.expect("telemetry");
        assert_eq!(telemetry.llm_latency_ms, Some(120.5));
        assert_eq!(telemetry.completion_tokens, Some(3));
        assert!(submission.store_response_logs);
    }

    #[test]
    fn create_request_requires_final_prompt() {
        let body = json!({
            "user_query": "q",
            "embedding": {"vector": []},
            "response": {"text": ""}
        });
        let err = serde_json::from_value::<CreateTraceRequest>(body).expect_err("missing field");
        assert!(err.to_string().contains("final_prompt"));
    }
}
