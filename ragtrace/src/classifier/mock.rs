use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{RagTraceError, Result};
use crate::models::{EntailmentLabel, EntailmentVerdict};

/// Deterministic in-process classifier.
///
/// A sentence is entailed when the evidence contains it (case-insensitive,
/// ignoring trailing periods). Everything else is neutral.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    entailment_score: f64,
    neutral_score: f64,
    fail_on_evidence: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self {
            entailment_score: 0.95,
            neutral_score: 0.6,
            fail_on_evidence: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confidence reported for entailed pairs.
    pub fn with_entailment_score(mut self, score: f64) -> Self {
        self.entailment_score = score;
        self
    }

    /// Fail any call whose evidence contains `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on_evidence = Some(needle.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn classify(&self, sentence: &str, evidence: &str) -> Result<EntailmentVerdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(needle) = &self.fail_on_evidence {
            if evidence.contains(needle.as_str()) {
                return Err(RagTraceError::Classifier(format!(
                    "mock classifier failure on evidence containing '{needle}'"
                )));
            }
        }

        let normalize = |text: &str| text.trim().trim_end_matches('.').to_lowercase();
        let claim = normalize(sentence);
        let premise = evidence.to_lowercase();

        if !claim.is_empty() && premise.contains(&claim) {
            Ok(EntailmentVerdict {
                label: EntailmentLabel::Entailment,
                score: self.entailment_score,
            })
        } else {
            Ok(EntailmentVerdict {
                label: EntailmentLabel::Neutral,
                score: self.neutral_score,
            })
        }
    }
}
