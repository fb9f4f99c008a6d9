use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use super::parse_timestamp;
use crate::error::Result;
use crate::models::{TelemetryMetrics, TelemetryRecord};

pub struct TelemetryRepository;

impl TelemetryRepository {
    pub async fn create(
        conn: &Connection,
        prompt_id: i64,
        metrics: &TelemetryMetrics,
        created_at: DateTime<Utc>,
    ) -> Result<TelemetryRecord> {
        conn.execute(
            r#"
            INSERT INTO telemetry (
                prompt_id, embedding_latency_ms, retrieval_latency_ms, llm_latency_ms,
                total_latency_ms, embedding_tokens, completion_tokens, api_cost, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                prompt_id,
                metrics.embedding_latency_ms,
                metrics.retrieval_latency_ms,
                metrics.llm_latency_ms,
                metrics.total_latency_ms,
                metrics.embedding_tokens,
                metrics.completion_tokens,
                metrics.api_cost,
                created_at.to_rfc3339()
            ],
        )
        .await?;

        Ok(TelemetryRecord {
            id: conn.last_insert_rowid(),
            prompt_id,
            metrics: metrics.clone(),
            created_at,
        })
    }

    pub async fn get_by_prompt(conn: &Connection, prompt_id: i64) -> Result<Option<TelemetryRecord>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, prompt_id, embedding_latency_ms, retrieval_latency_ms, llm_latency_ms,
                       total_latency_ms, embedding_tokens, completion_tokens, api_cost, created_at
                FROM telemetry WHERE prompt_id = ?1
                "#,
                params![prompt_id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(TelemetryRecord {
                id: row.get(0)?,
                prompt_id: row.get(1)?,
                metrics: TelemetryMetrics {
                    embedding_latency_ms: row.get(2)?,
                    retrieval_latency_ms: row.get(3)?,
                    llm_latency_ms: row.get(4)?,
                    total_latency_ms: row.get(5)?,
                    embedding_tokens: row.get(6)?,
                    completion_tokens: row.get(7)?,
                    api_cost: row.get(8)?,
                },
                created_at: parse_timestamp(&row.get::<String>(9)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_by_prompt(conn: &Connection, prompt_id: i64) -> Result<u64> {
        Ok(conn
            .execute("DELETE FROM telemetry WHERE prompt_id = ?1", params![prompt_id])
            .await?)
    }
}
