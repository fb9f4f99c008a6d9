mod api;
mod mock;
mod provider;


pub use api::{ClassificationApiClient, ClassifierApiConfig};
pub use mock::MockClassifier;
pub use provider::{ClassifierBackend, EntailmentProvider};

/// Confidence an entailment verdict must exceed for a sentence to count as supported.
pub const ENTAILMENT_THRESHOLD: f64 = 0.7;
