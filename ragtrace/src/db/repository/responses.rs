use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use super::{parse_optional_json, parse_timestamp};
use crate::error::Result;
use crate::models::ResponseRecord;

pub struct ResponseRepository;

impl ResponseRepository {
    pub async fn create(
        conn: &Connection,
        prompt_id: i64,
        text: &str,
        token_stream: Option<&[String]>,
        created_at: DateTime<Utc>,
    ) -> Result<ResponseRecord> {
        let stream_json = token_stream.map(serde_json::to_string).transpose()?;

        conn.execute(
            r#"
            INSERT INTO responses (prompt_id, text, token_stream, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![prompt_id, text, stream_json, created_at.to_rfc3339()],
        )
        .await?;

        Ok(ResponseRecord {
            id: conn.last_insert_rowid(),
            prompt_id,
            text: text.to_string(),
            token_stream: token_stream.map(<[_]>::to_vec),
            created_at,
        })
    }

    pub async fn get_by_id(conn: &Connection, id: i64) -> Result<Option<ResponseRecord>> {
        let mut rows = conn
            .query(
                "SELECT id, prompt_id, text, token_stream, created_at FROM responses WHERE id = ?1",
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_response(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_by_prompt(conn: &Connection, prompt_id: i64) -> Result<Vec<ResponseRecord>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, prompt_id, text, token_stream, created_at
                FROM responses WHERE prompt_id = ?1
                ORDER BY id ASC
                "#,
                params![prompt_id],
            )
            .await?;

        let mut responses = Vec::new();
        while let Some(row) = rows.next().await? {
            responses.push(Self::row_to_response(&row)?);
        }
        Ok(responses)
    }

    pub async fn delete_by_prompt(conn: &Connection, prompt_id: i64) -> Result<u64> {
        Ok(conn
            .execute("DELETE FROM responses WHERE prompt_id = ?1", params![prompt_id])
            .await?)
    }

    fn row_to_response(row: &libsql::Row) -> Result<ResponseRecord> {
        Ok(ResponseRecord {
            id: row.get(0)?,
            prompt_id: row.get(1)?,
            text: row.get(2)?,
            token_stream: parse_optional_json(row.get::<Option<String>>(3)?),
            created_at: parse_timestamp(&row.get::<String>(4)?),
        })
    }
}
