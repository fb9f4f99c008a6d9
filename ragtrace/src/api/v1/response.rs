//! # V1 response envelope
//!
//! Every v1 endpoint answers with the same top-level shape:
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "total": 42, "limit": 20, "offset": 0 },
//!   "error": { "code": "not_found", "message": "Trace 7 not found" }
//! }
//! ```
//!
//! `data` and `error` are mutually exclusive. `meta` only appears on list
//! endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::RagTraceError;

/// Machine-readable error code, serialized as snake_case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed body, bad parameters or failed validation. HTTP 400.
    InvalidRequest,
    /// Missing or unknown bearer token. HTTP 401.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// The entailment classifier or another upstream call failed. HTTP 502.
    UpstreamError,
    /// No classifier is configured. HTTP 503.
    Unavailable,
    /// Anything else. Details stay in the server log. HTTP 500.
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound => write!(f, "not_found"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Safe to show to end users.
    pub message: String,
}

/// Offset pagination metadata for list responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Offset of the next page. Absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u32>,
}

impl ResponseMeta {
    pub fn page(total: u64, limit: u32, offset: u32, returned: usize) -> Self {
        let next = u64::from(offset) + returned as u64;
        let next_offset = if returned > 0 && next < total {
            u32::try_from(next).ok()
        } else {
            None
        };
        Self {
            total: Some(total),
            limit: Some(limit),
            offset: Some(offset),
            next_offset,
        }
    }
}

/// Canonical v1 API response envelope.
///
/// The HTTP status is carried alongside the body but never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    pub fn success_with_meta(data: T, meta: ResponseMeta) -> Self {
        Self {
            data: Some(data),
            meta: Some(meta),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// HTTP 201.
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    /// HTTP 202. The work has been queued but not run.
    pub fn accepted(data: T) -> Self {
        Self::with_status(data, StatusCode::ACCEPTED)
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            meta: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn with_status(data: T, status: StatusCode) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize v1 response");
                let body = serde_json::json!({
                    "error": {
                        "code": ErrorCode::InternalError,
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<RagTraceError> for ApiResponse<T> {
    /// Internal failures are logged and replaced with a generic message.
    fn from(err: RagTraceError) -> Self {
        match err {
            RagTraceError::NotFound(msg) => ApiResponse::error(ErrorCode::NotFound, msg),
            RagTraceError::Validation(msg) => ApiResponse::error(ErrorCode::InvalidRequest, msg),
            RagTraceError::Json(e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }
            RagTraceError::ClassifierUnavailable(msg) => {
                ApiResponse::error(ErrorCode::Unavailable, msg)
            }
            ref upstream @ (RagTraceError::Classifier(_)
            | RagTraceError::Llm(_)
            | RagTraceError::Http(_)) => {
                tracing::warn!(error = %upstream, "Upstream error mapped to v1 response");
                ApiResponse::error(ErrorCode::UpstreamError, upstream.to_string())
            }
            ref internal @ (RagTraceError::Database(_)
            | RagTraceError::Storage(_)
            | RagTraceError::Io(_)
            | RagTraceError::Internal(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_omits_error_and_meta() {
        let json = serde_json::to_value(ApiResponse::success("hello")).expect("serialize");
        assert_eq!(json["data"], "hello");
        assert!(json.get("error").is_none());
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn error_response_omits_data() {
        let resp = ApiResponse::<()>::error(ErrorCode::NotFound, "Trace 3 not found");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["message"], "Trace 3 not found");
    }

    #[test]
    fn created_and_accepted_statuses() {
        assert_eq!(ApiResponse::created(1).status(), StatusCode::CREATED);
        assert_eq!(ApiResponse::accepted(1).status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn page_meta_reports_next_offset_until_exhausted() {
        let meta = ResponseMeta::page(45, 20, 20, 20);
        assert_eq!(meta.next_offset, Some(40));

        let last = ResponseMeta::page(45, 20, 40, 5);
        assert_eq!(last.next_offset, None);

        let json = serde_json::to_value(&last).expect("serialize");
        assert_eq!(json["total"], 45);
        assert!(json.get("next_offset").is_none());
    }

    #[test]
    fn storage_errors_do_not_leak_details() {
        let resp: ApiResponse<()> =
            RagTraceError::Storage("disk /var/lib/ragtrace full".to_string()).into();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = resp.error.expect("error").message;
        assert_eq!(message, "An internal error occurred");
    }

    #[test]
    fn validation_and_classifier_mapping() {
        let resp: ApiResponse<()> = RagTraceError::Validation("user_query blank".into()).into();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp: ApiResponse<()> = RagTraceError::Classifier("bad label".into()).into();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp: ApiResponse<()> = RagTraceError::ClassifierUnavailable("no key".into()).into();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let json = serde_json::to_value(ErrorCode::InvalidRequest).expect("serialize");
        assert_eq!(json, "invalid_request");
        assert_eq!(ErrorCode::UpstreamError.to_string(), "upstream_error");
    }
}
