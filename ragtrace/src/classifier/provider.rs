use serde::Deserialize;

use super::api::{ClassificationApiClient, ClassifierApiConfig, HUGGINGFACE_BASE_URL};
use super::mock::MockClassifier;
use crate::config::{parse_provider_model, ClassifierConfig, LlmConfig};
use crate::error::{RagTraceError, Result};
use crate::llm::prompts::{entailment_prompt, ENTAILMENT_SYSTEM_PROMPT};
use crate::llm::{CompletionOptions, LlmApiClient};
use crate::models::{EntailmentLabel, EntailmentVerdict};

#[derive(Clone)]
pub enum ClassifierBackend {
    Api(ClassificationApiClient),
    Llm(LlmApiClient),
    Mock(MockClassifier),
    Unavailable { reason: String },
}

#[derive(Debug, Deserialize)]
struct JudgeVerdict {
    label: String,
    confidence: f64,
}

/// Entailment classifier used by the groundedness scorer.
#[derive(Clone)]
pub struct EntailmentProvider {
    backend: ClassifierBackend,
    model: String,
}

impl EntailmentProvider {
    pub fn new(config: &ClassifierConfig) -> Self {
        let (provider, model) = parse_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "mock" => ClassifierBackend::Mock(MockClassifier::new()),
            "huggingface" | "api" => {
                let api_config = ClassifierApiConfig {
                    base_url: config
                        .base_url
                        .clone()
                        .unwrap_or_else(|| HUGGINGFACE_BASE_URL.to_string()),
                    api_key: config.api_key.clone(),
                    model: model.to_string(),
                    timeout_secs: config.timeout_secs,
                };
                match ClassificationApiClient::new(api_config) {
                    Ok(client) => ClassifierBackend::Api(client),
                    Err(e) => ClassifierBackend::Unavailable {
                        reason: e.to_string(),
                    },
                }
            }
            _ => match LlmApiClient::new(&LlmConfig::from(config)) {
                Ok(client) => ClassifierBackend::Llm(client),
                Err(e) => ClassifierBackend::Unavailable {
                    reason: e.to_string(),
                },
            },
        };

        if let ClassifierBackend::Unavailable { reason } = &backend {
            tracing::warn!(model = %config.model, reason = %reason, "Entailment classifier unavailable");
        }

        Self {
            backend,
            model: config.model.clone(),
        }
    }

    pub fn mock(mock: MockClassifier) -> Self {
        Self {
            backend: ClassifierBackend::Mock(mock),
            model: "mock".to_string(),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: ClassifierBackend::Unavailable {
                reason: reason.to_string(),
            },
            model: String::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, ClassifierBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &ClassifierBackend {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Judge whether `evidence` entails `sentence`.
    pub async fn classify(&self, sentence: &str, evidence: &str) -> Result<EntailmentVerdict> {
        match &self.backend {
            ClassifierBackend::Api(client) => client.classify(sentence, evidence).await,
            ClassifierBackend::Llm(client) => {
                let reply = client
                    .complete_json(
                        ENTAILMENT_SYSTEM_PROMPT,
                        &entailment_prompt(sentence, evidence),
                        CompletionOptions::default(),
                    )
                    .await?;
                parse_judge_verdict(reply)
            }
            ClassifierBackend::Mock(mock) => mock.classify(sentence, evidence),
            ClassifierBackend::Unavailable { reason } => {
                Err(RagTraceError::ClassifierUnavailable(reason.clone()))
            }
        }
    }
}

pub(crate) fn parse_judge_verdict(reply: serde_json::Value) -> Result<EntailmentVerdict> {
    let verdict: JudgeVerdict = serde_json::from_value(reply)
        .map_err(|e| RagTraceError::Classifier(format!("Unexpected judge reply: {e}")))?;

    let label: EntailmentLabel = verdict.label.parse().map_err(RagTraceError::Classifier)?;
    if !verdict.confidence.is_finite() || !(0.0..=1.0).contains(&verdict.confidence) {
        return Err(RagTraceError::Classifier(format!(
            "Judge confidence out of range: {}",
            verdict.confidence
        )));
    }

    Ok(EntailmentVerdict {
        label,
        score: verdict.confidence,
    })
}
