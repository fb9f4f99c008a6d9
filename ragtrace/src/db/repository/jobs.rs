use chrono::Utc;
use libsql::{params, Connection};

use super::parse_timestamp;
use crate::error::{RagTraceError, Result};
use crate::models::{JobStatus, ScoringJob};

const JOB_COLUMNS: &str =
    "id, response_id, status, attempts, last_error, check_id, created_at, updated_at";

pub struct JobRepository;

impl JobRepository {
    pub async fn enqueue(conn: &Connection, response_id: i64) -> Result<ScoringJob> {
        let now = Utc::now();
        conn.execute(
            r#"
            INSERT INTO scoring_jobs (response_id, status, attempts, created_at, updated_at)
            VALUES (?1, 'queued', 0, ?2, ?2)
            "#,
            params![response_id, now.to_rfc3339()],
        )
        .await?;

        Ok(ScoringJob {
            id: conn.last_insert_rowid(),
            response_id,
            status: JobStatus::Queued,
            attempts: 0,
            last_error: None,
            check_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_by_id(conn: &Connection, id: i64) -> Result<Option<ScoringJob>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM scoring_jobs WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_job(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Atomically move up to `limit` queued jobs to `running`, oldest first.
    pub async fn claim(conn: &Connection, limit: usize) -> Result<Vec<ScoringJob>> {
        let sql = format!(
            r#"
            UPDATE scoring_jobs
            SET status = 'running', attempts = attempts + 1, updated_at = ?2
            WHERE id IN (
                SELECT id FROM scoring_jobs
                WHERE status = 'queued'
                ORDER BY id ASC
                LIMIT ?1
            )
            RETURNING {JOB_COLUMNS}
            "#
        );
        let mut rows = conn
            .query(&sql, params![limit as i64, Utc::now().to_rfc3339()])
            .await?;

        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(Self::row_to_job(&row)?);
        }
        jobs.sort_by_key(|job| job.id);
        Ok(jobs)
    }

    pub async fn complete(conn: &Connection, id: i64, check_id: Option<i64>) -> Result<()> {
        conn.execute(
            r#"
            UPDATE scoring_jobs
            SET status = 'done', check_id = ?2, last_error = NULL, updated_at = ?3
            WHERE id = ?1
            "#,
            params![id, check_id, Utc::now().to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    pub async fn fail(conn: &Connection, id: i64, error: &str) -> Result<()> {
        conn.execute(
            r#"
            UPDATE scoring_jobs
            SET status = 'failed', last_error = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
            params![id, error, Utc::now().to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    /// Return jobs left `running` by a previous process to the queue.
    pub async fn requeue_running(conn: &Connection) -> Result<u64> {
        Ok(conn
            .execute(
                "UPDATE scoring_jobs SET status = 'queued', updated_at = ?1 WHERE status = 'running'",
                params![Utc::now().to_rfc3339()],
            )
            .await?)
    }

    pub async fn delete_by_prompt(conn: &Connection, prompt_id: i64) -> Result<u64> {
        Ok(conn
            .execute(
                r#"
                DELETE FROM scoring_jobs
                WHERE response_id IN (SELECT id FROM responses WHERE prompt_id = ?1)
                "#,
                params![prompt_id],
            )
            .await?)
    }

    fn row_to_job(row: &libsql::Row) -> Result<ScoringJob> {
        let id: i64 = row.get(0)?;
        let status: JobStatus = row.get::<String>(2)?.parse().map_err(|e| {
            tracing::warn!(job_id = id, error = %e, "Scoring job has an unreadable status");
            RagTraceError::Internal(format!("Scoring job {id}: {e}"))
        })?;

        Ok(ScoringJob {
            id,
            response_id: row.get(1)?,
            status,
            attempts: row.get(3)?,
            last_error: row.get(4)?,
            check_id: row.get(5)?,
            created_at: parse_timestamp(&row.get::<String>(6)?),
            updated_at: parse_timestamp(&row.get::<String>(7)?),
        })
    }
}
