use std::sync::Arc;

use tracing::info;

use crate::db::DatabaseBackend;
use crate::error::{RagTraceError, Result};
use crate::models::{HallucinationCheck, ScoringJob, TraceGraph};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct TracePage {
    pub traces: Vec<TraceGraph>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// Read, delete and re-score operations over stored traces.
#[derive(Clone)]
pub struct QueryService {
    db: Arc<dyn DatabaseBackend>,
}

impl QueryService {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }

    pub async fn get_trace(&self, prompt_id: i64) -> Result<TraceGraph> {
        self.db
            .get_trace(prompt_id)
            .await?
            .ok_or_else(|| RagTraceError::NotFound(format!("Trace {prompt_id} not found")))
    }

    pub async fn list_traces(&self, limit: Option<u32>, offset: Option<u32>) -> Result<TracePage> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0);
        let (traces, total) = self.db.list_traces(limit, offset).await?;
        Ok(TracePage {
            traces,
            total,
            limit,
            offset,
        })
    }

    pub async fn delete_trace(&self, prompt_id: i64) -> Result<()> {
        if !self.db.delete_trace(prompt_id).await? {
            return Err(RagTraceError::NotFound(format!("Trace {prompt_id} not found")));
        }
        info!(prompt_id, "Deleted trace");
        Ok(())
    }

    pub async fn list_checks(&self, response_id: i64) -> Result<Vec<HallucinationCheck>> {
        self.ensure_response(response_id).await?;
        self.db.list_checks(response_id).await
    }

    /// Queue a new scoring run. Each run appends a new check.
    pub async fn request_scoring(&self, response_id: i64) -> Result<ScoringJob> {
        self.ensure_response(response_id).await?;
        let job = self.db.enqueue_job(response_id).await?;
        info!(response_id, job_id = job.id, "Queued scoring job");
        Ok(job)
    }

    async fn ensure_response(&self, response_id: i64) -> Result<()> {
        if self.db.get_response(response_id).await?.is_none() {
            return Err(RagTraceError::NotFound(format!(
                "Response {response_id} not found"
            )));
        }
        Ok(())
    }
}
