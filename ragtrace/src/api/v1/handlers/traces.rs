//! v1 trace handlers: ingestion, lookup, listing and deletion.

use axum::extract::{Path, State};
use axum_extra::extract::Query;

use crate::api::v1::dto::{
    CreateTraceRequest, CreateTraceResponse, DeleteTraceResponse, ListTracesQuery, TraceResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};
use crate::api::{AppJson, AppState};
use crate::models::TraceSubmission;

/// `POST /api/v1/traces`
///
/// Validates and stores one trace in a single transaction. The response is
/// queued for scoring unless the caller supplied a check.
#[utoipa::path(
    post,
    path = "/api/v1/traces",
    tag = "traces",
    operation_id = "traces.create",
    request_body = CreateTraceRequest,
    responses(
        (status = 201, description = "Trace recorded", body = CreateTraceResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn create_trace(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateTraceRequest>,
) -> ApiResponse<CreateTraceResponse> {
    match state.ingestion.record(TraceSubmission::from(req)).await {
        Ok(outcome) => ApiResponse::created(outcome.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/traces/{promptId}`
#[utoipa::path(
    get,
    path = "/api/v1/traces/{promptId}",
    tag = "traces",
    operation_id = "traces.get",
    params(("promptId" = i64, Path, description = "Prompt ID")),
    responses(
        (status = 200, description = "Stored trace", body = TraceResponse),
        (status = 404, description = "Trace not found", body = ApiError),
    )
)]
pub async fn get_trace(
    State(state): State<AppState>,
    Path(prompt_id): Path<i64>,
) -> ApiResponse<TraceResponse> {
    match state.query.get_trace(prompt_id).await {
        Ok(trace) => ApiResponse::success(trace.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/traces`
///
/// Newest first. Pagination totals are returned in `meta`.
#[utoipa::path(
    get,
    path = "/api/v1/traces",
    tag = "traces",
    operation_id = "traces.list",
    params(ListTracesQuery),
    responses(
        (status = 200, description = "Page of traces", body = Vec<TraceResponse>),
    )
)]
pub async fn list_traces(
    State(state): State<AppState>,
    Query(query): Query<ListTracesQuery>,
) -> ApiResponse<Vec<TraceResponse>> {
    match state.query.list_traces(query.limit, query.offset).await {
        Ok(page) => {
            let meta = ResponseMeta::page(page.total, page.limit, page.offset, page.traces.len());
            let traces = page.traces.into_iter().map(Into::into).collect();
            ApiResponse::success_with_meta(traces, meta)
        }
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/traces/{promptId}`
///
/// Removes the prompt and everything recorded under it, including checks
/// and pending scoring jobs.
#[utoipa::path(
    delete,
    path = "/api/v1/traces/{promptId}",
    tag = "traces",
    operation_id = "traces.delete",
    params(("promptId" = i64, Path, description = "Prompt ID")),
    responses(
        (status = 200, description = "Trace deleted", body = DeleteTraceResponse),
        (status = 404, description = "Trace not found", body = ApiError),
    )
)]
pub async fn delete_trace(
    State(state): State<AppState>,
    Path(prompt_id): Path<i64>,
) -> ApiResponse<DeleteTraceResponse> {
    match state.query.delete_trace(prompt_id).await {
        Ok(()) => ApiResponse::success(DeleteTraceResponse {
            prompt_id,
            deleted: true,
        }),
        Err(e) => e.into(),
    }
}
