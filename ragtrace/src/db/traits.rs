use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    HallucinationCheck, NewHallucinationCheck, ResponseRecord, RetrievalRecord, ScoringJob,
    TraceGraph, TraceSubmission,
};

// ---------------------------------------------------------------------------
// Individual store traits
// ---------------------------------------------------------------------------

/// Persistence of whole trace graphs.
#[async_trait]
pub trait TraceStore: Send + Sync {
    /// Persist every row of a submission atomically. When `enqueue_scoring`
    /// is set and no check was pre-seeded, a scoring job is written in the
    /// same transaction and its id returned.
    async fn record_trace(
        &self,
        submission: &TraceSubmission,
        enqueue_scoring: bool,
    ) -> Result<(TraceGraph, Option<i64>)>;
    async fn get_trace(&self, prompt_id: i64) -> Result<Option<TraceGraph>>;
    /// Newest-first page of traces and the total number of traces.
    async fn list_traces(&self, limit: u32, offset: u32) -> Result<(Vec<TraceGraph>, u64)>;
    async fn delete_trace(&self, prompt_id: i64) -> Result<bool>;
    async fn get_response(&self, response_id: i64) -> Result<Option<ResponseRecord>>;
    async fn get_retrievals(&self, prompt_id: i64) -> Result<Vec<RetrievalRecord>>;
}

/// Append-only storage of hallucination checks.
#[async_trait]
pub trait CheckStore: Send + Sync {
    async fn create_check(
        &self,
        response_id: i64,
        check: &NewHallucinationCheck,
    ) -> Result<HallucinationCheck>;
    async fn list_checks(&self, response_id: i64) -> Result<Vec<HallucinationCheck>>;
}

/// Durable scoring job queue.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn enqueue_job(&self, response_id: i64) -> Result<ScoringJob>;
    async fn get_job(&self, id: i64) -> Result<Option<ScoringJob>>;
    async fn claim_jobs(&self, limit: usize) -> Result<Vec<ScoringJob>>;
    async fn complete_job(&self, id: i64, check_id: Option<i64>) -> Result<()>;
    async fn fail_job(&self, id: i64, error: &str) -> Result<()>;
    async fn requeue_running_jobs(&self) -> Result<u64>;
}

// ---------------------------------------------------------------------------
// Composite backend trait
// ---------------------------------------------------------------------------

/// Everything the service layer needs from the relational store.
#[async_trait]
pub trait DatabaseBackend: TraceStore + CheckStore + JobStore {
    /// Cheap liveness probe for health reporting.
    async fn ping(&self) -> Result<()>;
}
