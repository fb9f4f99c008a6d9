use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{EventBus, TraceEvent};
use crate::blob::offload::OffloadFlags;
use crate::blob::BlobOffloader;
use crate::db::DatabaseBackend;
use crate::error::Result;
use crate::models::{IngestionOutcome, TraceSubmission};

/// Validates and persists trace submissions.
#[derive(Clone)]
pub struct IngestionService {
    db: Arc<dyn DatabaseBackend>,
    offloader: Arc<BlobOffloader>,
    events: EventBus,
    embedding_dimensions: usize,
    auto_enqueue: bool,
}

impl IngestionService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        offloader: Arc<BlobOffloader>,
        events: EventBus,
        embedding_dimensions: usize,
        auto_enqueue: bool,
    ) -> Self {
        Self {
            db,
            offloader,
            events,
            embedding_dimensions,
            auto_enqueue,
        }
    }

    /// Record one trace.
    ///
    /// Validation happens before any write. All rows, including the scoring
    /// job, are written in a single transaction. Blob offload runs only after
    /// the commit and its failures are reported as warnings.
    pub async fn record(&self, submission: TraceSubmission) -> Result<IngestionOutcome> {
        submission.validate_with_dimensions(self.embedding_dimensions)?;

        let (trace, scoring_job_id) = self
            .db
            .record_trace(&submission, self.auto_enqueue)
            .await?;

        info!(
            prompt_id = trace.prompt_id(),
            scoring_job_id = ?scoring_job_id,
            "Recorded trace"
        );

        let flags = OffloadFlags::from(&submission);
        let offload_warnings = if flags.any() {
            self.offloader.offload(flags, &trace).await
        } else {
            Vec::new()
        };

        self.events.publish(TraceEvent::TraceRecorded {
            prompt_id: trace.prompt_id(),
            response_ids: trace.responses.iter().map(|r| r.response.id).collect(),
            scoring_job_id,
            recorded_at: Utc::now(),
        });

        Ok(IngestionOutcome {
            trace,
            scoring_job_id,
            offload_warnings,
        })
    }
}
