use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::classifier::ClassifierBackend;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub classifier: ClassifierStatus,
    pub stream: StreamStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DatabaseStatus {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ClassifierStatus {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StreamStatus {
    pub subscribers: usize,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let database = match state.db.ping().await {
        Ok(_) => DatabaseStatus {
            status: "ok".to_string(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            DatabaseStatus {
                status: "error".to_string(),
            }
        }
    };

    let provider = state.scorer.classifier();
    let (backend, reason) = match provider.backend() {
        ClassifierBackend::Api(_) => ("api", None),
        ClassifierBackend::Llm(_) => ("llm", None),
        ClassifierBackend::Mock(_) => ("mock", None),
        ClassifierBackend::Unavailable { reason } => ("unavailable", Some(reason.clone())),
    };
    let classifier = ClassifierStatus {
        status: if provider.is_available() {
            "available".to_string()
        } else {
            "unavailable".to_string()
        },
        backend: backend.to_string(),
        model: Some(provider.model().to_string()).filter(|m| !m.is_empty()),
        reason,
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        classifier,
        stream: StreamStatus {
            subscribers: state.events.subscriber_count(),
        },
    })
}
