//! Groundedness scoring of recorded responses.

mod scorer;
pub mod sentences;
mod worker;

pub use scorer::{groundedness, GroundednessScorer};
pub use sentences::split_sentences;
pub use worker::{ScoringWorker, WorkerPass};
