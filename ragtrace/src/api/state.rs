use std::sync::Arc;

use crate::blob::{BlobOffloader, BlobStore};
use crate::classifier::EntailmentProvider;
use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::scoring::GroundednessScorer;
use crate::services::{EventBus, IngestionService, QueryService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub events: EventBus,
    pub ingestion: IngestionService,
    pub query: QueryService,
    /// Shared with the background worker so both publish to the same bus.
    pub scorer: GroundednessScorer,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        blob_store: Arc<dyn BlobStore>,
        classifier: EntailmentProvider,
    ) -> Self {
        let config = Arc::new(config);
        let events = EventBus::new(config.events.channel_capacity);
        let offloader = Arc::new(BlobOffloader::new(blob_store, config.blob.clone()));
        let ingestion = IngestionService::new(
            db.clone(),
            offloader,
            events.clone(),
            config.embeddings.dimensions,
            config.scoring.auto_enqueue,
        );
        let query = QueryService::new(db.clone());
        let scorer = GroundednessScorer::new(db.clone(), classifier).with_events(events.clone());

        Self {
            config,
            db,
            events,
            ingestion,
            query,
            scorer,
        }
    }
}
