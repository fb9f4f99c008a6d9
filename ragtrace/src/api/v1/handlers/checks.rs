use axum::extract::{Path, State};

use crate::api::v1::dto::{HallucinationCheckResponse, ScoringJobResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;

/// `GET /api/v1/responses/{responseId}/checks`
#[utoipa::path(
    get,
    path = "/api/v1/responses/{responseId}/checks",
    tag = "checks",
    operation_id = "checks.list",
    params(("responseId" = i64, Path, description = "Response ID")),
    responses(
        (status = 200, description = "Checks in the order they were recorded", body = Vec<HallucinationCheckResponse>),
        (status = 404, description = "Response not found", body = ApiError),
    )
)]
pub async fn list_checks(
    State(state): State<AppState>,
    Path(response_id): Path<i64>,
) -> ApiResponse<Vec<HallucinationCheckResponse>> {
    match state.query.list_checks(response_id).await {
        Ok(checks) => ApiResponse::success(checks.into_iter().map(Into::into).collect()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/responses/{responseId}/checks:score`
///
/// Queues another scoring run. Each run appends a new check; earlier checks
/// are kept.
#[utoipa::path(
    post,
    path = "/api/v1/responses/{responseId}/checks:score",
    tag = "checks",
    operation_id = "checks.score",
    params(("responseId" = i64, Path, description = "Response ID")),
    responses(
        (status = 202, description = "Scoring job queued", body = ScoringJobResponse),
        (status = 404, description = "Response not found", body = ApiError),
    )
)]
pub async fn score_response(
    State(state): State<AppState>,
    Path(response_id): Path<i64>,
) -> ApiResponse<ScoringJobResponse> {
    match state.query.request_scoring(response_id).await {
        Ok(job) => ApiResponse::accepted(job.into()),
        Err(e) => e.into(),
    }
}
