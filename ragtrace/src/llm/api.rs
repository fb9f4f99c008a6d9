use std::time::Duration;

use serde_json::Value;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{RagTraceError, Result},
};

/// Providers that run on the operator's machine and take no key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "lmstudio", "local"];

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "lmstudio" => "http://localhost:1234/v1",
        _ => "https://api.openai.com/v1",
    }
}

/// Sampling knobs for a judge call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 64,
        }
    }
}

/// Chat client for an OpenAI-compatible endpoint acting as an NLI judge.
///
/// Every call is a single attempt: the scorer treats any failure as a failed
/// run, so the client's internal backoff is disabled.
#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (provider, model) = parse_llm_provider_model(&config.model);
        let provider = provider.to_lowercase();

        if !KEYLESS_PROVIDERS.contains(&provider.as_str()) && config.api_key.is_none() {
            return Err(RagTraceError::ClassifierUnavailable(format!(
                "API key required for provider '{provider}'"
            )));
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(&provider).to_string());
        let openai_config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(config.api_key.clone().unwrap_or_default());

        let mut http = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            http = http.timeout(Duration::from_secs(secs));
        }
        let http = http
            .build()
            .map_err(|e| RagTraceError::Llm(format!("Failed to create judge HTTP client: {e}")))?;

        let no_retries = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };

        // A bare model name is sent as-is to a local endpoint.
        let model = if provider == "local" {
            config.model.clone()
        } else {
            model.to_string()
        };

        Ok(Self {
            client: Client::with_config(openai_config)
                .with_http_client(http)
                .with_backoff(no_retries),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and parse the reply as JSON.
    pub async fn complete_json(
        &self,
        system_prompt: &str,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<Value> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| RagTraceError::Validation(format!("Invalid system prompt: {e}")))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| RagTraceError::Validation(format!("Invalid judge prompt: {e}")))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .temperature(options.temperature)
            .max_tokens(options.max_tokens)
            .build()
            .map_err(|e| RagTraceError::Validation(format!("Invalid judge request: {e}")))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let content = reply_content(response)?;
        tracing::debug!(model = %self.model, reply_len = content.len(), "Judge reply received");
        parse_json_reply(&content)
    }
}

fn reply_content(response: CreateChatCompletionResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(RagTraceError::Llm("Judge returned an empty reply".to_string()));
    }
    Ok(content)
}

fn map_openai_error(error: OpenAIError) -> RagTraceError {
    match error {
        OpenAIError::Reqwest(e) => match e.status() {
            Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => {
                RagTraceError::Llm("Judge rate limit exceeded".to_string())
            }
            Some(reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN) => {
                RagTraceError::Llm(format!("Judge authentication failed: {e}"))
            }
            _ => RagTraceError::Llm(format!("Judge request failed: {e}")),
        },
        OpenAIError::ApiError(api) => RagTraceError::Llm(describe_api_error(&api)),
        OpenAIError::JSONDeserialize(e) => {
            RagTraceError::Llm(format!("Failed to decode judge response: {e}"))
        }
        OpenAIError::InvalidArgument(message) => RagTraceError::Validation(message),
        other => RagTraceError::Llm(other.to_string()),
    }
}

fn describe_api_error(api: &ApiError) -> String {
    let code = api.code.as_deref().unwrap_or_default().to_lowercase();
    let kind = api.r#type.as_deref().unwrap_or_default().to_lowercase();

    if code.contains("rate_limit") || code == "insufficient_quota" || kind.contains("rate_limit") {
        format!("Judge rate limit exceeded: {}", api.message)
    } else if code.contains("invalid_api_key") || kind.contains("authentication") {
        format!("Judge authentication failed: {}", api.message)
    } else {
        format!("Judge API error: {}", api.message)
    }
}

/// Parse a model reply as JSON, tolerating a surrounding markdown code fence.
pub(crate) fn parse_json_reply(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(
            reply_preview = %content.chars().take(100).collect::<String>(),
            error = %e,
            "Judge reply is not JSON"
        );
        RagTraceError::Llm(format!("Judge reply is not JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(model: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
            base_url: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn test_local_providers_need_no_key() {
        let client = LlmApiClient::new(&llm_config("ollama/llama3", None)).unwrap();
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_hosted_provider_requires_key() {
        let result = LlmApiClient::new(&llm_config("openai/gpt-4o-mini", None));
        assert!(matches!(result, Err(RagTraceError::ClassifierUnavailable(_))));
    }

    #[test]
    fn test_default_base_urls() {
        assert_eq!(default_base_url("OpenRouter"), "https://openrouter.ai/api/v1");
        assert_eq!(default_base_url("openai"), "https://api.openai.com/v1");
    }

    #[test]
    fn test_api_error_descriptions() {
        let api = ApiError {
            message: "slow down".to_string(),
            r#type: None,
            param: None,
            code: Some("rate_limit_exceeded".to_string()),
        };
        assert!(describe_api_error(&api).starts_with("Judge rate limit exceeded"));
    }

    #[test]
    fn test_parse_json_reply_plain_and_fenced() {
        let plain = parse_json_reply(r#"{"label": "entailment", "confidence": 0.9}"#).unwrap();
        assert_eq!(plain["label"], "entailment");

        let fenced = parse_json_reply("```json\n{\"label\": \"neutral\"}\n```").unwrap();
        assert_eq!(fenced["label"], "neutral");

        assert!(parse_json_reply("not json").is_err());
    }
}
