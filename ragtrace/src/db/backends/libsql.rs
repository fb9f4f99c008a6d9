use async_trait::async_trait;
use chrono::Utc;
use libsql::Transaction;

use crate::db::connection::Database;
use crate::db::repository::{
    CheckRepository, JobRepository, PromptRepository, ResponseRepository, RetrievalRepository,
    TraceRepository,
};
use crate::db::traits::{CheckStore, DatabaseBackend, JobStore, TraceStore};
use crate::error::Result;
use crate::models::{
    HallucinationCheck, NewHallucinationCheck, ResponseRecord, RetrievalRecord, ScoringJob,
    TraceGraph, TraceSubmission,
};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Commit on success, roll back on error.
async fn finish<T>(tx: Transaction, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                tracing::warn!(error = %rollback_error, "Failed to roll back transaction");
            }
            Err(error)
        }
    }
}

#[async_trait]
impl TraceStore for LibSqlBackend {
    async fn record_trace(
        &self,
        submission: &TraceSubmission,
        enqueue_scoring: bool,
    ) -> Result<(TraceGraph, Option<i64>)> {
        let conn = self.db.connect().await?;
        let tx = conn.transaction().await?;
        let outcome = TraceRepository::insert(&tx, submission, enqueue_scoring, Utc::now()).await;
        finish(tx, outcome).await
    }

    async fn get_trace(&self, prompt_id: i64) -> Result<Option<TraceGraph>> {
        let conn = self.db.connect().await?;
        TraceRepository::load(&conn, prompt_id).await
    }

    async fn list_traces(&self, limit: u32, offset: u32) -> Result<(Vec<TraceGraph>, u64)> {
        let conn = self.db.connect().await?;
        let total = PromptRepository::count(&conn).await?;
        let mut traces = Vec::new();
        for prompt in PromptRepository::list(&conn, limit, offset).await? {
            if let Some(trace) = TraceRepository::load(&conn, prompt.id).await? {
                traces.push(trace);
            }
        }
        Ok((traces, total))
    }

    async fn delete_trace(&self, prompt_id: i64) -> Result<bool> {
        let conn = self.db.connect().await?;
        let tx = conn.transaction().await?;
        let outcome = TraceRepository::delete(&tx, prompt_id).await;
        finish(tx, outcome).await
    }

    async fn get_response(&self, response_id: i64) -> Result<Option<ResponseRecord>> {
        let conn = self.db.connect().await?;
        ResponseRepository::get_by_id(&conn, response_id).await
    }

    async fn get_retrievals(&self, prompt_id: i64) -> Result<Vec<RetrievalRecord>> {
        let conn = self.db.connect().await?;
        RetrievalRepository::list_by_prompt(&conn, prompt_id).await
    }
}

#[async_trait]
impl CheckStore for LibSqlBackend {
    async fn create_check(
        &self,
        response_id: i64,
        check: &NewHallucinationCheck,
    ) -> Result<HallucinationCheck> {
        let conn = self.db.connect().await?;
        CheckRepository::create(&conn, response_id, check, Utc::now()).await
    }

    async fn list_checks(&self, response_id: i64) -> Result<Vec<HallucinationCheck>> {
        let conn = self.db.connect().await?;
        CheckRepository::list_by_response(&conn, response_id).await
    }
}

#[async_trait]
impl JobStore for LibSqlBackend {
    async fn enqueue_job(&self, response_id: i64) -> Result<ScoringJob> {
        let conn = self.db.connect().await?;
        JobRepository::enqueue(&conn, response_id).await
    }

    async fn get_job(&self, id: i64) -> Result<Option<ScoringJob>> {
        let conn = self.db.connect().await?;
        JobRepository::get_by_id(&conn, id).await
    }

    async fn claim_jobs(&self, limit: usize) -> Result<Vec<ScoringJob>> {
        let conn = self.db.connect().await?;
        JobRepository::claim(&conn, limit).await
    }

    async fn complete_job(&self, id: i64, check_id: Option<i64>) -> Result<()> {
        let conn = self.db.connect().await?;
        JobRepository::complete(&conn, id, check_id).await
    }

    async fn fail_job(&self, id: i64, error: &str) -> Result<()> {
        let conn = self.db.connect().await?;
        JobRepository::fail(&conn, id, error).await
    }

    async fn requeue_running_jobs(&self) -> Result<u64> {
        let conn = self.db.connect().await?;
        JobRepository::requeue_running(&conn).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}
