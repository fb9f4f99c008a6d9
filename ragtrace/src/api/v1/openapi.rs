use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ragtrace API",
        version = "1.0.0",
        description = "Records RAG pipeline traces and scores each response for groundedness against its retrieved evidence.",
    ),
    paths(
        handlers::health::health_check,
        handlers::traces::create_trace,
        handlers::traces::list_traces,
        handlers::traces::get_trace,
        handlers::traces::delete_trace,
        handlers::stream::stream_traces,
        handlers::checks::list_checks,
        handlers::checks::score_response,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // Common
        dto::V1EntailmentLabel,
        dto::V1JobStatus,
        // Traces
        dto::CreateTraceRequest,
        dto::EmbeddingPayload,
        dto::RetrievalPayload,
        dto::ResponsePayload,
        dto::TelemetryDto,
        dto::ListTracesQuery,
        dto::CreateTraceResponse,
        dto::TraceResponse,
        dto::PromptResponse,
        dto::EmbeddingResponse,
        dto::RetrievalResponse,
        dto::ResponseRecordResponse,
        dto::TelemetryResponse,
        dto::DeleteTraceResponse,
        // Checks
        dto::EntailmentResultDto,
        dto::HallucinationCheckInput,
        dto::HallucinationCheckResponse,
        dto::ScoringJobResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::ClassifierStatus,
        handlers::health::StreamStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "traces", description = "Trace ingestion, lookup, deletion and live stream"),
        (name = "checks", description = "Hallucination checks and re-scoring"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_trace_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/v1/health",
            "/api/v1/traces",
            "/api/v1/traces/{promptId}",
            "/api/v1/traces:stream",
            "/api/v1/responses/{responseId}/checks",
            "/api/v1/responses/{responseId}/checks:score",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {expected}"
            );
        }
    }
}
