mod checks;
mod embeddings;
mod jobs;
mod prompts;
mod responses;
mod retrievals;
mod telemetry;
mod traces;

pub use checks::CheckRepository;
pub use embeddings::EmbeddingRepository;
pub use jobs::JobRepository;
pub use prompts::PromptRepository;
pub use responses::ResponseRepository;
pub use retrievals::RetrievalRepository;
pub use telemetry::TelemetryRepository;
pub use traces::TraceRepository;

use chrono::{DateTime, Utc};

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_optional_json<T: serde::de::DeserializeOwned>(value: Option<String>) -> Option<T> {
    value.and_then(|raw| serde_json::from_str(&raw).ok())
}

#[cfg(test)]
pub(crate) async fn test_connection() -> libsql::Connection {
    let conn = libsql::Builder::new_local(":memory:")
        .build()
        .await
        .unwrap()
        .connect()
        .unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").await.unwrap();
    crate::db::schema::init_schema(&conn).await.unwrap();
    conn
}
