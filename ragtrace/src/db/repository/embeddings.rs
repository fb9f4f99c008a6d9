use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use super::{parse_optional_json, parse_timestamp};
use crate::error::Result;
use crate::models::EmbeddingRecord;

pub struct EmbeddingRepository;

impl EmbeddingRepository {
    pub async fn create(
        conn: &Connection,
        prompt_id: i64,
        vector: &[f32],
        retrieval_candidates: Option<&[serde_json::Value]>,
        created_at: DateTime<Utc>,
    ) -> Result<EmbeddingRecord> {
        let candidates_json = retrieval_candidates
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            r#"
            INSERT INTO embeddings (prompt_id, vector, retrieval_candidates, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                prompt_id,
                serde_json::to_string(vector)?,
                candidates_json,
                created_at.to_rfc3339()
            ],
        )
        .await?;

        Ok(EmbeddingRecord {
            id: conn.last_insert_rowid(),
            prompt_id,
            vector: vector.to_vec(),
            retrieval_candidates: retrieval_candidates.map(<[_]>::to_vec),
            created_at,
        })
    }

    pub async fn get_by_prompt(conn: &Connection, prompt_id: i64) -> Result<Option<EmbeddingRecord>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, prompt_id, vector, retrieval_candidates, created_at
                FROM embeddings WHERE prompt_id = ?1
                "#,
                params![prompt_id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(EmbeddingRecord {
                id: row.get(0)?,
                prompt_id: row.get(1)?,
                vector: serde_json::from_str(&row.get::<String>(2)?)?,
                retrieval_candidates: parse_optional_json(row.get::<Option<String>>(3)?),
                created_at: parse_timestamp(&row.get::<String>(4)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_by_prompt(conn: &Connection, prompt_id: i64) -> Result<u64> {
        Ok(conn
            .execute("DELETE FROM embeddings WHERE prompt_id = ?1", params![prompt_id])
            .await?)
    }
}
