use std::sync::Arc;

use libsql::{Builder, Connection};

use crate::config::DatabaseConfig;
use crate::error::Result;

use super::schema;

/// Database-wide pragmas, normalized to values SQLite accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pragmas {
    busy_timeout_ms: u64,
    journal_mode: &'static str,
    synchronous: &'static str,
}

impl Pragmas {
    fn from_config(config: &DatabaseConfig) -> Self {
        const JOURNAL_MODES: &[&str] = &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];
        const SYNC_LEVELS: &[&str] = &["OFF", "NORMAL", "FULL", "EXTRA"];

        Self {
            busy_timeout_ms: config.busy_timeout_ms,
            journal_mode: pick(&config.journal_mode, JOURNAL_MODES, "WAL"),
            synchronous: pick(&config.synchronous, SYNC_LEVELS, "NORMAL"),
        }
    }
}

fn pick(value: &str, allowed: &[&'static str], fallback: &'static str) -> &'static str {
    let wanted = value.trim().to_uppercase();
    allowed
        .iter()
        .copied()
        .find(|candidate| *candidate == wanted)
        .unwrap_or(fallback)
}

/// Handle to the trace store. Cloning shares the underlying libSQL database.
#[derive(Clone)]
pub struct Database {
    inner: Arc<libsql::Database>,
    pragmas: Pragmas,
}

impl Database {
    /// Open (or create) the database named by `config` and apply the schema.
    ///
    /// `libsql://` and `https://` URLs open a remote database, or an embedded
    /// replica when `local_path` is set. Anything else is a local file, with
    /// an optional `file:` prefix.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let token = config.auth_token.clone().unwrap_or_default();
        let inner = if config.url.starts_with("libsql://") || config.url.starts_with("https://") {
            match &config.local_path {
                Some(replica) => {
                    Builder::new_remote_replica(replica, config.url.clone(), token)
                        .build()
                        .await?
                }
                None => Builder::new_remote(config.url.clone(), token).build().await?,
            }
        } else {
            let path = config.url.strip_prefix("file:").unwrap_or(&config.url);
            Builder::new_local(path).build().await?
        };

        let database = Self {
            inner: Arc::new(inner),
            pragmas: Pragmas::from_config(config),
        };

        let conn = database.connect().await?;
        database.apply_database_pragmas(&conn).await;
        schema::init_schema(&conn).await?;

        Ok(database)
    }

    /// Open a connection with `foreign_keys` and `busy_timeout` set.
    /// Both are per-connection in SQLite.
    pub async fn connect(&self) -> Result<Connection> {
        let conn = self.inner.connect()?;
        let pragmas = format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.pragmas.busy_timeout_ms
        );
        if let Err(e) = conn.execute_batch(&pragmas).await {
            tracing::warn!(error = %e, "Failed to apply connection pragmas");
        }
        Ok(conn)
    }

    async fn apply_database_pragmas(&self, conn: &Connection) {
        for (name, value) in [
            ("journal_mode", self.pragmas.journal_mode),
            ("synchronous", self.pragmas.synchronous),
        ] {
            if let Err(e) = conn.execute_batch(&format!("PRAGMA {name} = {value}")).await {
                tracing::warn!(pragma = name, value, error = %e, "Failed to set SQLite pragma");
            }
        }
    }

    /// Run a trivial query on a fresh connection.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.connect().await?;
        let mut rows = conn.query("SELECT 1", ()).await?;
        rows.next().await?;
        Ok(())
    }
}
