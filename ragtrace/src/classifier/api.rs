use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RagTraceError, Result};
use crate::models::{EntailmentLabel, EntailmentVerdict};

pub const HUGGINGFACE_BASE_URL: &str = "https://api-inference.huggingface.co/models";

#[derive(Debug, Clone)]
pub struct ClassifierApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PairInput<'a> {
    text: &'a str,
    text_pair: &'a str,
}

#[derive(Debug, Serialize)]
struct ClassificationRequest<'a> {
    inputs: PairInput<'a>,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Text-classification endpoints answer with either a flat or a batched list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Batched(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
            Self::Flat(scores) => scores,
        }
    }
}

/// Client for a Hugging Face compatible text-classification endpoint
/// serving an MNLI model.
#[derive(Clone)]
pub struct ClassificationApiClient {
    client: Client,
    config: ClassifierApiConfig,
}

impl ClassificationApiClient {
    pub fn new(config: ClassifierApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().map_err(|e| {
            RagTraceError::Classifier(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Classify one (hypothesis, premise) pair. Single attempt, no retries.
    pub async fn classify(&self, sentence: &str, evidence: &str) -> Result<EntailmentVerdict> {
        let request = ClassificationRequest {
            inputs: PairInput {
                text: sentence,
                text_pair: evidence,
            },
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref api_key) = self.config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                    RagTraceError::Classifier(format!("Invalid API key header: {e}"))
                })?,
            );
        }

        let resp = self
            .client
            .post(self.endpoint())
            .headers(headers)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagTraceError::Classifier(format!("Request failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(RagTraceError::ClassifierUnavailable(format!(
                "Classifier rejected credentials ({status}): {body}"
            )));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RagTraceError::Classifier(format!(
                "API error {status}: {body}"
            )));
        }

        let body: ClassificationResponse = resp
            .json()
            .await
            .map_err(|e| RagTraceError::Classifier(format!("Failed to parse response: {e}")))?;

        pick_verdict(body.into_scores())
    }
}

/// Highest-scoring entry wins.
fn pick_verdict(scores: Vec<LabelScore>) -> Result<EntailmentVerdict> {
    let best = scores
        .into_iter()
        .filter(|s| s.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| RagTraceError::Classifier("Classifier returned no labels".to_string()))?;

    let label: EntailmentLabel = best
        .label
        .parse()
        .map_err(RagTraceError::Classifier)?;

    if !(0.0..=1.0).contains(&best.score) {
        return Err(RagTraceError::Classifier(format!(
            "Classifier score out of range: {}",
            best.score
        )));
    }

    Ok(EntailmentVerdict {
        label,
        score: best.score,
    })
}
