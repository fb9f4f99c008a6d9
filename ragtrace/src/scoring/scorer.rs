use std::sync::Arc;

use tracing::{debug, info};

use super::sentences::split_sentences;
use crate::classifier::{EntailmentProvider, ENTAILMENT_THRESHOLD};
use crate::db::DatabaseBackend;
use crate::error::Result;
use crate::models::{
    EntailmentLabel, EntailmentResult, HallucinationCheck, NewHallucinationCheck, ResponseRecord,
    RetrievalRecord,
};
use crate::services::{EventBus, TraceEvent};

/// Fraction of sentences supported, with the denominator floored at one so
/// an empty response scores 0.0.
pub fn groundedness(supported: usize, sentence_count: usize) -> f64 {
    (supported as f64 / sentence_count.max(1) as f64).clamp(0.0, 1.0)
}

/// Scores a response for groundedness against its prompt's retrieved evidence.
#[derive(Clone)]
pub struct GroundednessScorer {
    db: Arc<dyn DatabaseBackend>,
    classifier: EntailmentProvider,
    events: Option<EventBus>,
}

impl GroundednessScorer {
    pub fn new(db: Arc<dyn DatabaseBackend>, classifier: EntailmentProvider) -> Self {
        Self {
            db,
            classifier,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn classifier(&self) -> &EntailmentProvider {
        &self.classifier
    }

    /// Run one scoring run and persist its check.
    ///
    /// Returns `Ok(None)` without writing anything when the response does not
    /// exist. A classifier failure aborts the run before anything is written.
    pub async fn score_response(&self, response_id: i64) -> Result<Option<HallucinationCheck>> {
        let Some(response) = self.db.get_response(response_id).await? else {
            debug!(response_id, "Response not found, skipping scoring run");
            return Ok(None);
        };

        let retrievals = self.db.get_retrievals(response.prompt_id).await?;
        let outcome = self.evaluate(&response, &retrievals).await?;
        let check = self.db.create_check(response_id, &outcome).await?;

        info!(
            response_id,
            check_id = check.id,
            groundedness = check.groundedness_score,
            unsupported = check.unsupported_sentences.len(),
            "Recorded hallucination check"
        );

        if let Some(events) = &self.events {
            events.publish(TraceEvent::CheckRecorded {
                response_id,
                check_id: check.id,
                groundedness_score: check.groundedness_score,
                checked_at: check.checked_at,
            });
        }

        Ok(Some(check))
    }

    /// Compute a check for `response` without persisting it.
    pub async fn evaluate(
        &self,
        response: &ResponseRecord,
        retrievals: &[RetrievalRecord],
    ) -> Result<NewHallucinationCheck> {
        let evidence: Vec<&str> = retrievals
            .iter()
            .filter_map(RetrievalRecord::evidence_text)
            .collect();
        let sentences = split_sentences(&response.text);

        let mut entailment_results = Vec::new();
        let mut unsupported_sentences = Vec::new();
        let mut supported = 0usize;

        for sentence in &sentences {
            let mut is_supported = false;

            for text in &evidence {
                let verdict = self.classifier.classify(sentence, text).await?;
                entailment_results.push(EntailmentResult {
                    sentence: sentence.clone(),
                    evidence: (*text).to_string(),
                    label: verdict.label,
                    score: verdict.score,
                });

                if verdict.label == EntailmentLabel::Entailment
                    && verdict.score > ENTAILMENT_THRESHOLD
                {
                    is_supported = true;
                    break;
                }
            }

            if is_supported {
                supported += 1;
            } else {
                unsupported_sentences.push(sentence.clone());
            }
        }

        Ok(NewHallucinationCheck {
            groundedness_score: groundedness(supported, sentences.len()),
            unsupported_sentences,
            entailment_results,
        })
    }
}
