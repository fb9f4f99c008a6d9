use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use super::parse_timestamp;
use crate::error::Result;
use crate::models::Prompt;

pub struct PromptRepository;

impl PromptRepository {
    pub async fn create(
        conn: &Connection,
        user_query: &str,
        system_prompt: Option<&str>,
        final_prompt: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Prompt> {
        conn.execute(
            r#"
            INSERT INTO prompts (user_query, system_prompt, final_prompt, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                user_query,
                system_prompt,
                final_prompt,
                created_at.to_rfc3339()
            ],
        )
        .await?;

        Ok(Prompt {
            id: conn.last_insert_rowid(),
            user_query: user_query.to_string(),
            system_prompt: system_prompt.map(str::to_string),
            final_prompt: final_prompt.to_string(),
            created_at,
        })
    }

    pub async fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Prompt>> {
        let mut rows = conn
            .query(
                "SELECT id, user_query, system_prompt, final_prompt, created_at FROM prompts WHERE id = ?1",
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_prompt(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Page of prompts, newest first.
    pub async fn list(conn: &Connection, limit: u32, offset: u32) -> Result<Vec<Prompt>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, user_query, system_prompt, final_prompt, created_at
                FROM prompts
                ORDER BY id DESC
                LIMIT ?1 OFFSET ?2
                "#,
                params![limit as i64, offset as i64],
            )
            .await?;

        let mut prompts = Vec::new();
        while let Some(row) = rows.next().await? {
            prompts.push(Self::row_to_prompt(&row)?);
        }
        Ok(prompts)
    }

    pub async fn count(conn: &Connection) -> Result<u64> {
        let mut rows = conn.query("SELECT COUNT(*) FROM prompts", ()).await?;
        let total = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(total.max(0) as u64)
    }

    pub async fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let affected = conn
            .execute("DELETE FROM prompts WHERE id = ?1", params![id])
            .await?;
        Ok(affected > 0)
    }

    fn row_to_prompt(row: &libsql::Row) -> Result<Prompt> {
        Ok(Prompt {
            id: row.get(0)?,
            user_query: row.get(1)?,
            system_prompt: row.get(2)?,
            final_prompt: row.get(3)?,
            created_at: parse_timestamp(&row.get::<String>(4)?),
        })
    }
}
