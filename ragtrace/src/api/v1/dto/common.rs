//! Wire enums shared by several v1 endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{EntailmentLabel, JobStatus};

/// JSON object carried verbatim (retrieval metadata, candidate summaries).
pub type Metadata = serde_json::Value;

/// Wire format: `"entailment"`, `"contradiction"` or `"neutral"`.
/// Upper- and title-case spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum V1EntailmentLabel {
    #[serde(alias = "ENTAILMENT", alias = "Entailment")]
    Entailment,
    #[serde(alias = "CONTRADICTION", alias = "Contradiction")]
    Contradiction,
    #[serde(alias = "NEUTRAL", alias = "Neutral")]
    Neutral,
}

impl From<EntailmentLabel> for V1EntailmentLabel {
    fn from(label: EntailmentLabel) -> Self {
        match label {
            EntailmentLabel::Entailment => Self::Entailment,
            EntailmentLabel::Contradiction => Self::Contradiction,
            EntailmentLabel::Neutral => Self::Neutral,
        }
    }
}

impl From<V1EntailmentLabel> for EntailmentLabel {
    fn from(label: V1EntailmentLabel) -> Self {
        match label {
            V1EntailmentLabel::Entailment => Self::Entailment,
            V1EntailmentLabel::Contradiction => Self::Contradiction,
            V1EntailmentLabel::Neutral => Self::Neutral,
        }
    }
}

/// Wire format: `"queued"`, `"running"`, `"done"` or `"failed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum V1JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl From<JobStatus> for V1JobStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Queued => Self::Queued,
            JobStatus::Running => Self::Running,
            JobStatus::Done => Self::Done,
            JobStatus::Failed => Self::Failed,
        }
    }
}
