use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{NewHallucinationCheck, TelemetryMetrics, TraceGraph};
use crate::error::{RagTraceError, Result};

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingInput {
    pub vector: Vec<f32>,
    pub retrieval_candidates: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RetrievalInput {
    #[validate(length(min = 1))]
    pub document_id: String,
    pub similarity_score: f64,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseInput {
    pub text: String,
    pub token_stream: Option<Vec<String>>,
    pub hallucination_check: Option<NewHallucinationCheck>,
}

/// One complete trace as submitted by an instrumented pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TraceSubmission {
    #[validate(custom(function = "not_blank"))]
    pub user_query: String,
    pub system_prompt: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub final_prompt: String,
    pub embedding: EmbeddingInput,
    #[serde(default)]
    #[validate(nested)]
    pub retrievals: Vec<RetrievalInput>,
    pub response: ResponseInput,
    pub telemetry: Option<TelemetryMetrics>,
    #[serde(default)]
    pub store_embedding_dump: bool,
    #[serde(default)]
    pub store_retrieval_logs: bool,
    #[serde(default)]
    pub store_response_logs: bool,
}

impl TraceSubmission {
    /// Validate the submission against field rules and the deployment's
    /// embedding dimension. Nothing is written when this fails.
    pub fn validate_with_dimensions(&self, dimensions: usize) -> Result<()> {
        self.validate()
            .map_err(|e| RagTraceError::Validation(e.to_string()))?;

        let vector = &self.embedding.vector;
        if !vector.is_empty() && vector.len() != dimensions {
            return Err(RagTraceError::Validation(format!(
                "embedding.vector has {} dimensions, expected {}",
                vector.len(),
                dimensions
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(RagTraceError::Validation(
                "embedding.vector must contain only finite values".to_string(),
            ));
        }

        for (i, retrieval) in self.retrievals.iter().enumerate() {
            if !retrieval.similarity_score.is_finite() {
                return Err(RagTraceError::Validation(format!(
                    "retrievals[{i}].similarity_score must be finite"
                )));
            }
        }

        if let Some(check) = &self.response.hallucination_check {
            validate_check(check)?;
        }

        if let Some(telemetry) = &self.telemetry {
            for (name, value) in telemetry.float_fields() {
                if let Some(v) = value {
                    if !v.is_finite() || v < 0.0 {
                        return Err(RagTraceError::Validation(format!(
                            "telemetry.{name} must be a non-negative number"
                        )));
                    }
                }
            }
            for (name, value) in [
                ("embedding_tokens", telemetry.embedding_tokens),
                ("completion_tokens", telemetry.completion_tokens),
            ] {
                if matches!(value, Some(v) if v < 0) {
                    return Err(RagTraceError::Validation(format!(
                        "telemetry.{name} must be non-negative"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn in_unit_range(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

pub(crate) fn validate_check(check: &NewHallucinationCheck) -> Result<()> {
    if !in_unit_range(check.groundedness_score) {
        return Err(RagTraceError::Validation(
            "groundedness_score must be within [0, 1]".to_string(),
        ));
    }
    if let Some(i) = check
        .entailment_results
        .iter()
        .position(|r| !in_unit_range(r.score))
    {
        return Err(RagTraceError::Validation(format!(
            "entailment_results[{i}].score must be within [0, 1]"
        )));
    }
    Ok(())
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionOutcome {
    pub trace: TraceGraph,
    pub scoring_job_id: Option<i64>,
    /// Blob offload failures; the relational write is kept regardless.
    pub offload_warnings: Vec<String>,
}
