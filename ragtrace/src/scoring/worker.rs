use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use super::GroundednessScorer;
use crate::config::ScoringConfig;
use crate::db::DatabaseBackend;
use crate::error::Result;
use crate::models::ScoringJob;

/// Counts from one polling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPass {
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Drains the scoring job queue.
#[derive(Clone)]
pub struct ScoringWorker {
    db: Arc<dyn DatabaseBackend>,
    scorer: GroundednessScorer,
    config: ScoringConfig,
}

impl ScoringWorker {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        scorer: GroundednessScorer,
        config: ScoringConfig,
    ) -> Self {
        Self { db, scorer, config }
    }

    pub fn interval_secs(&self) -> u64 {
        self.config.poll_interval_secs.max(1)
    }

    /// Put jobs orphaned by a previous process back on the queue.
    pub async fn recover(&self) -> Result<u64> {
        let requeued = self.db.requeue_running_jobs().await?;
        if requeued > 0 {
            warn!(requeued, "Re-queued scoring jobs left running by a previous process");
        }
        Ok(requeued)
    }

    /// Claim one batch of queued jobs and score them with bounded concurrency.
    pub async fn run_once(&self) -> Result<WorkerPass> {
        let jobs = self.db.claim_jobs(self.config.batch_size.max(1)).await?;
        if jobs.is_empty() {
            return Ok(WorkerPass::default());
        }

        info!(claimed = jobs.len(), "Claimed scoring jobs");
        let claimed = jobs.len();

        let outcomes: Vec<bool> = stream::iter(jobs)
            .map(|job| self.process(job))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let completed = outcomes.iter().filter(|ok| **ok).count();
        Ok(WorkerPass {
            claimed,
            completed,
            failed: claimed - completed,
        })
    }

    /// Run passes until one claims nothing.
    pub async fn drain(&self) -> Result<WorkerPass> {
        let mut total = WorkerPass::default();
        loop {
            let pass = self.run_once().await?;
            if pass.claimed == 0 {
                return Ok(total);
            }
            total.claimed += pass.claimed;
            total.completed += pass.completed;
            total.failed += pass.failed;
        }
    }

    async fn process(&self, job: ScoringJob) -> bool {
        match self.scorer.score_response(job.response_id).await {
            Ok(check) => {
                let check_id = check.map(|c| c.id);
                if let Err(e) = self.db.complete_job(job.id, check_id).await {
                    error!(job_id = job.id, response_id = job.response_id, error = %e, "Failed to mark scoring job done");
                    return false;
                }
                true
            }
            Err(e) => {
                error!(
                    job_id = job.id,
                    response_id = job.response_id,
                    attempts = job.attempts,
                    error = %e,
                    "Scoring run failed"
                );
                if let Err(mark_err) = self.db.fail_job(job.id, &e.to_string()).await {
                    error!(job_id = job.id, error = %mark_err, "Failed to mark scoring job failed");
                }
                false
            }
        }
    }
}
