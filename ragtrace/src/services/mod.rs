mod events;
mod ingestion;
mod query;

pub use events::{EventBus, TraceEvent};
pub use ingestion::IngestionService;
pub use query::{QueryService, TracePage};
