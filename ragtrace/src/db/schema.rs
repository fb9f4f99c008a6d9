use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Prompts: one row per recorded pipeline execution
        CREATE TABLE IF NOT EXISTS prompts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_query TEXT NOT NULL,
            system_prompt TEXT,
            final_prompt TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_prompts_created_at ON prompts(created_at);

        -- Embeddings: vector stored as a JSON array of f32
        CREATE TABLE IF NOT EXISTS embeddings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prompt_id INTEGER NOT NULL UNIQUE,
            vector TEXT NOT NULL DEFAULT '[]',
            retrieval_candidates TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (prompt_id) REFERENCES prompts(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS retrievals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prompt_id INTEGER NOT NULL,
            document_id TEXT NOT NULL,
            similarity_score REAL NOT NULL,
            metadata TEXT,
            position INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (prompt_id) REFERENCES prompts(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_retrievals_prompt_id ON retrievals(prompt_id, position);

        CREATE TABLE IF NOT EXISTS responses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prompt_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            token_stream TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (prompt_id) REFERENCES prompts(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_responses_prompt_id ON responses(prompt_id);

        -- Hallucination checks: append-only, one per scoring run
        CREATE TABLE IF NOT EXISTS hallucination_checks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            response_id INTEGER NOT NULL,
            groundedness_score REAL NOT NULL
                CHECK (groundedness_score >= 0.0 AND groundedness_score <= 1.0),
            unsupported_sentences TEXT NOT NULL DEFAULT '[]',
            entailment_results TEXT NOT NULL DEFAULT '[]',
            checked_at TEXT NOT NULL,
            FOREIGN KEY (response_id) REFERENCES responses(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_checks_response_id ON hallucination_checks(response_id);

        CREATE TABLE IF NOT EXISTS telemetry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prompt_id INTEGER NOT NULL UNIQUE,
            embedding_latency_ms REAL,
            retrieval_latency_ms REAL,
            llm_latency_ms REAL,
            total_latency_ms REAL,
            embedding_tokens INTEGER,
            completion_tokens INTEGER,
            api_cost REAL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (prompt_id) REFERENCES prompts(id) ON DELETE CASCADE
        );

        -- Scoring jobs: durable queue feeding the groundedness worker
        CREATE TABLE IF NOT EXISTS scoring_jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            response_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'queued'
                CHECK (status IN ('queued', 'running', 'done', 'failed')),
            attempts INTEGER NOT NULL DEFAULT 0,
            last_error TEXT,
            check_id INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (response_id) REFERENCES responses(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_scoring_jobs_status ON scoring_jobs(status, id);
        CREATE INDEX IF NOT EXISTS idx_scoring_jobs_response_id ON scoring_jobs(response_id);
        "#,
    )
    .await?;

    Ok(())
}
