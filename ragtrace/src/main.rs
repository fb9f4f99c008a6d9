use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ragtrace::api::{create_router, AppState};
use ragtrace::blob::create_blob_store;
use ragtrace::classifier::EntailmentProvider;
use ragtrace::config::Config;
use ragtrace::db::{Database, DatabaseBackend, LibSqlBackend};
use ragtrace::scoring::{GroundednessScorer, ScoringWorker};

#[derive(Parser)]
#[command(name = "ragtrace")]
#[command(about = "Record RAG pipeline traces and score responses for groundedness")]
struct Args {
    /// Serve the API without the background scoring worker
    #[arg(long)]
    no_worker: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Score one response now and print the resulting check as JSON
    Score {
        #[arg(value_name = "RESPONSE_ID")]
        response_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();

    tracing::info!("Initializing database...");
    let raw_db = Database::new(&config.database).await?;
    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(raw_db));

    tracing::info!("Initializing entailment classifier: {}...", config.classifier.model);
    let classifier = EntailmentProvider::new(&config.classifier);
    if !classifier.is_available() {
        tracing::warn!("Entailment classifier unavailable - scoring runs will fail until it is configured");
    }

    if let Some(Command::Score { response_id }) = args.command {
        return score_once(db, classifier, response_id).await;
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!("RAGTRACE_API_KEYS is not set - trace routes accept unauthenticated requests");
    }

    let blob_store = create_blob_store(&config.blob);
    let state = AppState::new(config.clone(), db, blob_store, classifier);

    let cancel_token = CancellationToken::new();

    if config.scoring.worker_enabled && !args.no_worker {
        let worker = ScoringWorker::new(
            state.db.clone(),
            state.scorer.clone(),
            config.scoring.clone(),
        );
        if let Err(e) = worker.recover().await {
            tracing::error!(error = %e, "Failed to re-queue interrupted scoring jobs");
        }

        tracing::info!(
            "Starting scoring worker... (interval={}s, batch={}, concurrency={})",
            worker.interval_secs(),
            config.scoring.batch_size,
            config.scoring.concurrency
        );
        let token = cancel_token.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Scoring worker shutting down...");
                        break;
                    }
                    _ = tokio::time::sleep(tokio::time::Duration::from_secs(worker.interval_secs())) => {
                        if let Err(e) = worker.run_once().await {
                            tracing::error!(error = %e, "Scoring worker error");
                        }
                    }
                }
            }
        });
    } else {
        tracing::info!("Scoring worker disabled; queued jobs wait for another process");
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("ragtrace starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ragtrace=info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn score_once(
    db: Arc<dyn DatabaseBackend>,
    classifier: EntailmentProvider,
    response_id: i64,
) -> anyhow::Result<()> {
    let scorer = GroundednessScorer::new(db, classifier);
    match scorer.score_response(response_id).await? {
        Some(check) => {
            println!("{}", serde_json::to_string_pretty(&check)?);
            Ok(())
        }
        None => Err(anyhow::anyhow!("Response {response_id} not found")),
    }
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
