use serde::Deserialize;
use std::env;
use std::path::PathBuf;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub embeddings: EmbeddingsConfig,
    pub blob: BlobConfig,
    pub scoring: ScoringConfig,
    pub classifier: ClassifierConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    /// Largest accepted request body. Trace payloads carry full vectors.
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
    pub busy_timeout_ms: u64,
    pub journal_mode: String,
    pub synchronous: String,
}

impl DatabaseConfig {
    /// Local file database at `path`, as used by tests and the `score` command.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            url: path.into(),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
        }
    }
}

/// Shape of the embedding vectors recorded with each trace.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub dimensions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobBackendKind {
    Filesystem,
    Memory,
}

impl std::str::FromStr for BlobBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "filesystem" | "fs" | "file" => Ok(Self::Filesystem),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("Unknown blob backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    pub backend: BlobBackendKind,
    pub root: PathBuf,
    pub embeddings_bucket: String,
    pub retrievals_bucket: String,
    pub responses_bucket: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackendKind::Filesystem,
            root: PathBuf::from("./blobs"),
            embeddings_bucket: "embeddings".to_string(),
            retrievals_bucket: "retrievals".to_string(),
            responses_bucket: "responses".to_string(),
        }
    }
}

/// Background scoring worker settings
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Enqueue a scoring job for every ingested response that was not pre-scored.
    pub auto_enqueue: bool,
    pub worker_enabled: bool,
    pub poll_interval_secs: u64,
    pub batch_size: usize,
    pub concurrency: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            auto_enqueue: true,
            worker_enabled: true,
            poll_interval_secs: 5,
            batch_size: 16,
            concurrency: 4,
        }
    }
}

/// Entailment classifier configuration.
///
/// `model` carries a provider prefix, e.g. `huggingface/roberta-large-mnli`
/// or `openai/gpt-4o-mini`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "huggingface/roberta-large-mnli".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

/// Chat model settings for the LLM entailment judge
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl From<&ClassifierConfig> for LlmConfig {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let blob_defaults = BlobConfig::default();
        let scoring_defaults = ScoringConfig::default();
        let classifier_defaults = ClassifierConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("RAGTRACE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("RAGTRACE_PORT", 8000),
                api_keys: env::var("RAGTRACE_API_KEYS")
                    .map(|keys| {
                        keys.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                max_body_bytes: parse_env_or("RAGTRACE_MAX_BODY_BYTES", 8 * 1024 * 1024),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:ragtrace.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
                journal_mode: env::var("DATABASE_JOURNAL_MODE")
                    .unwrap_or_else(|_| "WAL".to_string()),
                synchronous: env::var("DATABASE_SYNCHRONOUS")
                    .unwrap_or_else(|_| "NORMAL".to_string()),
            },
            embeddings: EmbeddingsConfig {
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 1536),
            },
            blob: BlobConfig {
                backend: parse_env_or("BLOB_BACKEND", blob_defaults.backend),
                root: env::var("BLOB_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(blob_defaults.root),
                embeddings_bucket: env::var("BLOB_EMBEDDINGS_BUCKET")
                    .unwrap_or(blob_defaults.embeddings_bucket),
                retrievals_bucket: env::var("BLOB_RETRIEVALS_BUCKET")
                    .unwrap_or(blob_defaults.retrievals_bucket),
                responses_bucket: env::var("BLOB_RESPONSES_BUCKET")
                    .unwrap_or(blob_defaults.responses_bucket),
            },
            scoring: ScoringConfig {
                auto_enqueue: parse_env_or("SCORING_AUTO_ENQUEUE", scoring_defaults.auto_enqueue),
                worker_enabled: parse_env_or(
                    "SCORING_WORKER_ENABLED",
                    scoring_defaults.worker_enabled,
                ),
                poll_interval_secs: parse_env_or(
                    "SCORING_POLL_INTERVAL_SECS",
                    scoring_defaults.poll_interval_secs,
                ),
                batch_size: parse_env_or("SCORING_BATCH_SIZE", scoring_defaults.batch_size),
                concurrency: parse_env_or("SCORING_CONCURRENCY", scoring_defaults.concurrency),
            },
            classifier: ClassifierConfig {
                model: env::var("ENTAILMENT_MODEL").unwrap_or(classifier_defaults.model),
                api_key: env::var("ENTAILMENT_API_KEY").ok(),
                base_url: env::var("ENTAILMENT_BASE_URL").ok(),
                timeout_secs: parse_env_opt("ENTAILMENT_TIMEOUT_SECS"),
            },
            events: EventsConfig {
                channel_capacity: parse_env_or("EVENT_CHANNEL_CAPACITY", 256),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Providers served by an OpenAI-compatible chat API.
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Providers served by a text-classification inference endpoint.
pub const KNOWN_CLASSIFIER_PROVIDERS: &[&str] = &["huggingface", "api", "mock"];

/// Parse a model name into (provider, model) tuple.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str())
            || KNOWN_CLASSIFIER_PROVIDERS.contains(&prefix_lower.as_str())
        {
            return (prefix, rest);
        }
    }
    if model.eq_ignore_ascii_case("mock") {
        return ("mock", "");
    }
    // Bare model names are served by a text-classification endpoint
    ("api", model)
}

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::remove_var("EMBEDDING_DIMENSIONS");
        std::env::remove_var("SCORING_AUTO_ENQUEUE");
        std::env::remove_var("BLOB_BACKEND");
        std::env::remove_var("ENTAILMENT_TIMEOUT_SECS");

        let config = Config::default();
        assert_eq!(config.embeddings.dimensions, 1536);
        assert!(config.scoring.auto_enqueue);
        assert_eq!(config.blob.backend, BlobBackendKind::Filesystem);
        assert_eq!(config.blob.responses_bucket, "responses");
        assert!(config.classifier.timeout_secs.is_none());
    }

    #[test]
    fn test_scoring_config_from_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::set_var("SCORING_AUTO_ENQUEUE", "false");
        std::env::set_var("SCORING_CONCURRENCY", "8");

        let config = Config::default();
        assert!(!config.scoring.auto_enqueue);
        assert_eq!(config.scoring.concurrency, 8);

        std::env::remove_var("SCORING_AUTO_ENQUEUE");
        std::env::remove_var("SCORING_CONCURRENCY");
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::set_var("EMBEDDING_DIMENSIONS", "not-a-number");
        let config = Config::default();
        assert_eq!(config.embeddings.dimensions, 1536);
        std::env::remove_var("EMBEDDING_DIMENSIONS");
    }

    #[test]
    fn test_blob_backend_parsing() {
        assert_eq!(
            "memory".parse::<BlobBackendKind>().unwrap(),
            BlobBackendKind::Memory
        );
        assert_eq!(
            " FS ".parse::<BlobBackendKind>().unwrap(),
            BlobBackendKind::Filesystem
        );
        assert!("s3".parse::<BlobBackendKind>().is_err());
    }

    #[test]
    fn test_api_keys_ignore_blank_entries() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::set_var("RAGTRACE_API_KEYS", "a, ,b,");
        let config = Config::default();
        assert_eq!(config.server.api_keys, vec!["a".to_string(), "b".to_string()]);
        std::env::remove_var("RAGTRACE_API_KEYS");
    }

    #[test]
    fn test_parse_provider_model() {
        assert_eq!(
            parse_provider_model("huggingface/roberta-large-mnli"),
            ("huggingface", "roberta-large-mnli")
        );
        assert_eq!(
            parse_provider_model("openai/gpt-4o-mini"),
            ("openai", "gpt-4o-mini")
        );
        assert_eq!(parse_provider_model("mock"), ("mock", ""));
        assert_eq!(
            parse_provider_model("facebook/bart-large-mnli"),
            ("api", "facebook/bart-large-mnli")
        );
    }

    #[test]
    fn test_llm_config_from_classifier() {
        let classifier = ClassifierConfig {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: Some("sk-test".to_string()),
            base_url: None,
            timeout_secs: Some(10),
        };
        let llm = LlmConfig::from(&classifier);
        assert_eq!(llm.model, "openai/gpt-4o-mini");
        assert_eq!(llm.timeout_secs, Some(10));
    }
}
