use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use super::parse_timestamp;
use crate::error::Result;
use crate::models::{HallucinationCheck, NewHallucinationCheck};

pub struct CheckRepository;

impl CheckRepository {
    pub async fn create(
        conn: &Connection,
        response_id: i64,
        check: &NewHallucinationCheck,
        checked_at: DateTime<Utc>,
    ) -> Result<HallucinationCheck> {
        conn.execute(
            r#"
            INSERT INTO hallucination_checks (
                response_id, groundedness_score, unsupported_sentences, entailment_results, checked_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                response_id,
                check.groundedness_score,
                serde_json::to_string(&check.unsupported_sentences)?,
                serde_json::to_string(&check.entailment_results)?,
                checked_at.to_rfc3339()
            ],
        )
        .await?;

        Ok(HallucinationCheck {
            id: conn.last_insert_rowid(),
            response_id,
            groundedness_score: check.groundedness_score,
            unsupported_sentences: check.unsupported_sentences.clone(),
            entailment_results: check.entailment_results.clone(),
            checked_at,
        })
    }

    /// Checks of a response in insertion order (newest last).
    pub async fn list_by_response(
        conn: &Connection,
        response_id: i64,
    ) -> Result<Vec<HallucinationCheck>> {
        let mut rows = conn
            .query(
                r#"
                SELECT id, response_id, groundedness_score, unsupported_sentences,
                       entailment_results, checked_at
                FROM hallucination_checks
                WHERE response_id = ?1
                ORDER BY id ASC
                "#,
                params![response_id],
            )
            .await?;

        let mut checks = Vec::new();
        while let Some(row) = rows.next().await? {
            checks.push(HallucinationCheck {
                id: row.get(0)?,
                response_id: row.get(1)?,
                groundedness_score: row.get(2)?,
                unsupported_sentences: serde_json::from_str(&row.get::<String>(3)?)?,
                entailment_results: serde_json::from_str(&row.get::<String>(4)?)?,
                checked_at: parse_timestamp(&row.get::<String>(5)?),
            });
        }
        Ok(checks)
    }

    pub async fn delete_by_prompt(conn: &Connection, prompt_id: i64) -> Result<u64> {
        Ok(conn
            .execute(
                r#"
                DELETE FROM hallucination_checks
                WHERE response_id IN (SELECT id FROM responses WHERE prompt_id = ?1)
                "#,
                params![prompt_id],
            )
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{test_connection, PromptRepository, ResponseRepository};
    use crate::models::{EntailmentLabel, EntailmentResult};

    async fn seed_response(conn: &Connection) -> i64 {
        let prompt = PromptRepository::create(conn, "q", None, "p", Utc::now())
            .await
            .unwrap();
        ResponseRepository::create(conn, prompt.id, "Paris is in France.", None, Utc::now())
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_checks_append_in_order() {
        let conn = test_connection().await;
        let response_id = seed_response(&conn).await;

        let first = NewHallucinationCheck {
            groundedness_score: 0.0,
            unsupported_sentences: vec!["Paris is in France".to_string()],
            entailment_results: vec![EntailmentResult {
                sentence: "Paris is in France".to_string(),
                evidence: "Berlin is in Germany.".to_string(),
                label: EntailmentLabel::Neutral,
                score: 0.8,
            }],
        };
        let second = NewHallucinationCheck {
            groundedness_score: 1.0,
            ..Default::default()
        };

        CheckRepository::create(&conn, response_id, &first, Utc::now())
            .await
            .unwrap();
        CheckRepository::create(&conn, response_id, &second, Utc::now())
            .await
            .unwrap();

        let checks = CheckRepository::list_by_response(&conn, response_id)
            .await
            .unwrap();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].entailment_results, first.entailment_results);
        assert_eq!(checks[1].groundedness_score, 1.0);
    }

    #[tokio::test]
    async fn test_score_outside_unit_range_rejected_by_store() {
        let conn = test_connection().await;
        let response_id = seed_response(&conn).await;
        let bad = NewHallucinationCheck {
            groundedness_score: 1.2,
            ..Default::default()
        };
        assert!(CheckRepository::create(&conn, response_id, &bad, Utc::now())
            .await
            .is_err());
    }
}
