use chrono::{DateTime, Utc};
use libsql::Connection;

use super::{
    CheckRepository, EmbeddingRepository, JobRepository, PromptRepository, ResponseRepository,
    RetrievalRepository, TelemetryRepository,
};
use crate::error::Result;
use crate::models::{ResponseWithChecks, TraceGraph, TraceSubmission};

/// Composes the per-table repositories into whole-trace operations.
///
/// None of these open a transaction; callers pass a transaction when the
/// operation must be atomic.
pub struct TraceRepository;

impl TraceRepository {
    /// Insert every row of a submission. Returns the persisted graph and the
    /// id of the scoring job, if one was enqueued.
    pub async fn insert(
        conn: &Connection,
        submission: &TraceSubmission,
        enqueue_scoring: bool,
        now: DateTime<Utc>,
    ) -> Result<(TraceGraph, Option<i64>)> {
        let prompt = PromptRepository::create(
            conn,
            &submission.user_query,
            submission.system_prompt.as_deref(),
            &submission.final_prompt,
            now,
        )
        .await?;

        let embedding = EmbeddingRepository::create(
            conn,
            prompt.id,
            &submission.embedding.vector,
            submission.embedding.retrieval_candidates.as_deref(),
            now,
        )
        .await?;

        let mut retrievals = Vec::with_capacity(submission.retrievals.len());
        for (position, input) in submission.retrievals.iter().enumerate() {
            retrievals.push(
                RetrievalRepository::create(conn, prompt.id, position as i64, input, now).await?,
            );
        }

        let response = ResponseRepository::create(
            conn,
            prompt.id,
            &submission.response.text,
            submission.response.token_stream.as_deref(),
            now,
        )
        .await?;

        let mut checks = Vec::new();
        if let Some(seeded) = &submission.response.hallucination_check {
            checks.push(CheckRepository::create(conn, response.id, seeded, now).await?);
        }

        let telemetry = match &submission.telemetry {
            Some(metrics) => Some(TelemetryRepository::create(conn, prompt.id, metrics, now).await?),
            None => None,
        };

        let scoring_job_id = if enqueue_scoring && checks.is_empty() {
            Some(JobRepository::enqueue(conn, response.id).await?.id)
        } else {
            None
        };

        let graph = TraceGraph {
            prompt,
            embedding: Some(embedding),
            retrievals,
            responses: vec![ResponseWithChecks {
                response,
                hallucination_checks: checks,
            }],
            telemetry,
        };

        Ok((graph, scoring_job_id))
    }

    pub async fn load(conn: &Connection, prompt_id: i64) -> Result<Option<TraceGraph>> {
        let Some(prompt) = PromptRepository::get_by_id(conn, prompt_id).await? else {
            return Ok(None);
        };

        let embedding = EmbeddingRepository::get_by_prompt(conn, prompt_id).await?;
        let retrievals = RetrievalRepository::list_by_prompt(conn, prompt_id).await?;
        let telemetry = TelemetryRepository::get_by_prompt(conn, prompt_id).await?;

        let mut responses = Vec::new();
        for response in ResponseRepository::list_by_prompt(conn, prompt_id).await? {
            let hallucination_checks = CheckRepository::list_by_response(conn, response.id).await?;
            responses.push(ResponseWithChecks {
                response,
                hallucination_checks,
            });
        }

        Ok(Some(TraceGraph {
            prompt,
            embedding,
            retrievals,
            responses,
            telemetry,
        }))
    }

    /// Delete a prompt and all of its dependents, children first.
    pub async fn delete(conn: &Connection, prompt_id: i64) -> Result<bool> {
        CheckRepository::delete_by_prompt(conn, prompt_id).await?;
        JobRepository::delete_by_prompt(conn, prompt_id).await?;
        ResponseRepository::delete_by_prompt(conn, prompt_id).await?;
        RetrievalRepository::delete_by_prompt(conn, prompt_id).await?;
        EmbeddingRepository::delete_by_prompt(conn, prompt_id).await?;
        TelemetryRepository::delete_by_prompt(conn, prompt_id).await?;
        PromptRepository::delete(conn, prompt_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_connection;
    use crate::models::{
        EmbeddingInput, NewHallucinationCheck, ResponseInput, RetrievalInput, TelemetryMetrics,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn submission() -> TraceSubmission {
        TraceSubmission {
            user_query: "Where is Paris?".to_string(),
            system_prompt: Some("Be brief.".to_string()),
            final_prompt: "Be brief. Where is Paris?".to_string(),
            embedding: EmbeddingInput {
                vector: vec![0.5, 0.25],
                retrieval_candidates: Some(vec![json!({"doc_id": "d1", "score": 0.9})]),
            },
            retrievals: vec![
                RetrievalInput {
                    document_id: "d1".to_string(),
                    similarity_score: 0.9,
                    metadata: Some(json!({"text": "Paris is in France."})),
                },
                RetrievalInput {
                    document_id: "d2".to_string(),
                    similarity_score: 0.4,
                    metadata: None,
                },
            ],
            response: ResponseInput {
                text: "Paris is in France.".to_string(),
                token_stream: Some(vec!["Paris".to_string(), " is".to_string()]),
                hallucination_check: None,
            },
            telemetry: Some(TelemetryMetrics {
                total_latency_ms: Some(250.0),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_then_load_is_identical() {
        let conn = test_connection().await;
        let (inserted, job_id) = TraceRepository::insert(&conn, &submission(), true, Utc::now())
            .await
            .unwrap();
        assert!(job_id.is_some());

        let loaded = TraceRepository::load(&conn, inserted.prompt.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.prompt, inserted.prompt);
        assert_eq!(loaded.embedding, inserted.embedding);
        assert_eq!(loaded.retrievals, inserted.retrievals);
        assert_eq!(loaded.responses, inserted.responses);
        assert_eq!(loaded.telemetry, inserted.telemetry);
    }

    #[tokio::test]
    async fn test_pre_seeded_check_skips_job() {
        let conn = test_connection().await;
        let mut s = submission();
        s.response.hallucination_check = Some(NewHallucinationCheck {
            groundedness_score: 0.5,
            ..Default::default()
        });

        let (graph, job_id) = TraceRepository::insert(&conn, &s, true, Utc::now())
            .await
            .unwrap();
        assert!(job_id.is_none());
        assert_eq!(graph.responses[0].hallucination_checks.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_every_dependent() {
        let conn = test_connection().await;
        let (graph, _) = TraceRepository::insert(&conn, &submission(), true, Utc::now())
            .await
            .unwrap();
        let prompt_id = graph.prompt.id;

        assert!(TraceRepository::delete(&conn, prompt_id).await.unwrap());
        assert!(TraceRepository::load(&conn, prompt_id).await.unwrap().is_none());

        for table in [
            "embeddings",
            "retrievals",
            "responses",
            "telemetry",
            "hallucination_checks",
            "scoring_jobs",
        ] {
            let mut rows = conn
                .query(&format!("SELECT COUNT(*) FROM {table}"), ())
                .await
                .unwrap();
            let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
            assert_eq!(count, 0, "{table} still has rows");
        }

        assert!(!TraceRepository::delete(&conn, prompt_id).await.unwrap());
    }
}
