//! Hallucination check and scoring job DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{V1EntailmentLabel, V1JobStatus};
use crate::models;

/// One attempted `(sentence, evidence)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EntailmentResultDto {
    pub sentence: String,
    pub evidence: String,
    pub label: V1EntailmentLabel,
    /// Classifier confidence in `[0, 1]`.
    pub score: f64,
}

impl From<models::EntailmentResult> for EntailmentResultDto {
    fn from(r: models::EntailmentResult) -> Self {
        Self {
            sentence: r.sentence,
            evidence: r.evidence,
            label: r.label.into(),
            score: r.score,
        }
    }
}

impl From<EntailmentResultDto> for models::EntailmentResult {
    fn from(r: EntailmentResultDto) -> Self {
        Self {
            sentence: r.sentence,
            evidence: r.evidence,
            label: r.label.into(),
            score: r.score,
        }
    }
}

/// A check computed by the caller and stored with the trace.
/// Responses submitted with one are not queued for scoring.
///
/// Both lists may be absent or `null`; either way they are stored empty.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct HallucinationCheckInput {
    pub groundedness_score: f64,
    #[serde(default)]
    pub unsupported_sentences: Option<Vec<String>>,
    #[serde(default)]
    pub entailment_results: Option<Vec<EntailmentResultDto>>,
}

impl From<HallucinationCheckInput> for models::NewHallucinationCheck {
    fn from(input: HallucinationCheckInput) -> Self {
        Self {
            groundedness_score: input.groundedness_score,
            unsupported_sentences: input.unsupported_sentences.unwrap_or_default(),
            entailment_results: input
                .entailment_results
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HallucinationCheckResponse {
    pub id: i64,
    pub response_id: i64,
    pub groundedness_score: f64,
    pub unsupported_sentences: Vec<String>,
    pub entailment_results: Vec<EntailmentResultDto>,
    pub checked_at: DateTime<Utc>,
}

impl From<models::HallucinationCheck> for HallucinationCheckResponse {
    fn from(check: models::HallucinationCheck) -> Self {
        Self {
            id: check.id,
            response_id: check.response_id,
            groundedness_score: check.groundedness_score,
            unsupported_sentences: check.unsupported_sentences,
            entailment_results: check
                .entailment_results
                .into_iter()
                .map(Into::into)
                .collect(),
            checked_at: check.checked_at,
        }
    }
}

/// Returned by `POST /v1/responses/{responseId}/checks:score`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ScoringJobResponse {
    pub job_id: i64,
    pub response_id: i64,
    pub status: V1JobStatus,
    pub attempts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<models::ScoringJob> for ScoringJobResponse {
    fn from(job: models::ScoringJob) -> Self {
        Self {
            job_id: job.id,
            response_id: job.response_id,
            status: job.status.into(),
            attempts: job.attempts,
            last_error: job.last_error,
            check_id: job.check_id,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
