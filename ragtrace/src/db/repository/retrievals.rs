use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use super::{parse_optional_json, parse_timestamp};
use crate::error::Result;
use crate::models::{RetrievalInput, RetrievalRecord};

pub struct RetrievalRepository;

impl RetrievalRepository {
    pub async fn create(
        conn: &Connection,
        prompt_id: i64,
        position: i64,
        input: &RetrievalInput,
        created_at: DateTime<Utc>,
    ) -> Result<RetrievalRecord> {
        let metadata_json = input.metadata.as_ref().map(serde_json::to_string).transpose()?;

        conn.execute(
            r#"
            INSERT INTO retrievals (prompt_id, document_id, similarity_score, metadata, position, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                prompt_id,
                input.document_id.clone(),
                input.similarity_score,
                metadata_json,
                position,
                created_at.to_rfc3339()
            ],
        )
        .await?;

        Ok(RetrievalRecord {
            id: conn.last_insert_rowid(),
            prompt_id,
            document_id: input.document_id.clone(),
            similarity_score: input.similarity_score,
            metadata: input.metadata.clone(),
            position,
            created_at,
        })
    }

    /// All retrievals of a prompt in submission order.
    pub async fn list_by_prompt(conn: &Connection, prompt_id: i64) -> Result<Vec<RetrievalRecord>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, prompt_id, document_id, similarity_score, metadata, position, created_at
                FROM retrievals
                WHERE prompt_id = ?1
                ORDER BY position ASC, id ASC
                "#,
                params![prompt_id],
            )
            .await?;

        let mut retrievals = Vec::new();
        while let Some(row) = rows.next().await? {
            retrievals.push(RetrievalRecord {
                id: row.get(0)?,
                prompt_id: row.get(1)?,
                document_id: row.get(2)?,
                similarity_score: row.get(3)?,
                metadata: parse_optional_json(row.get::<Option<String>>(4)?),
                position: row.get(5)?,
                created_at: parse_timestamp(&row.get::<String>(6)?),
            });
        }
        Ok(retrievals)
    }

    pub async fn delete_by_prompt(conn: &Connection, prompt_id: i64) -> Result<u64> {
        Ok(conn
            .execute("DELETE FROM retrievals WHERE prompt_id = ?1", params![prompt_id])
            .await?)
    }
}
