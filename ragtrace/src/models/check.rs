use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Natural-language-inference verdict for one (sentence, evidence) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntailmentLabel {
    #[serde(alias = "ENTAILMENT", alias = "Entailment")]
    Entailment,
    #[serde(alias = "CONTRADICTION", alias = "Contradiction")]
    Contradiction,
    #[serde(alias = "NEUTRAL", alias = "Neutral")]
    Neutral,
}

impl std::fmt::Display for EntailmentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entailment => write!(f, "entailment"),
            Self::Contradiction => write!(f, "contradiction"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for EntailmentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entailment" => Ok(Self::Entailment),
            "contradiction" => Ok(Self::Contradiction),
            "neutral" => Ok(Self::Neutral),
            _ => Err(format!("Unknown entailment label: {s}")),
        }
    }
}

/// Classifier output for a single pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntailmentVerdict {
    pub label: EntailmentLabel,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntailmentResult {
    pub sentence: String,
    pub evidence: String,
    pub label: EntailmentLabel,
    pub score: f64,
}

/// Groundedness outcome of one scoring run (or pre-seeded by the caller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationCheck {
    pub id: i64,
    pub response_id: i64,
    pub groundedness_score: f64,
    pub unsupported_sentences: Vec<String>,
    pub entailment_results: Vec<EntailmentResult>,
    pub checked_at: DateTime<Utc>,
}

/// Check contents before they are assigned an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewHallucinationCheck {
    pub groundedness_score: f64,
    #[serde(default)]
    pub unsupported_sentences: Vec<String>,
    #[serde(default)]
    pub entailment_results: Vec<EntailmentResult>,
}
