use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::RagTraceError;

/// `axum::Json` whose rejections are reported through the v1 envelope as
/// `invalid_request` instead of axum's plain-text 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(RagTraceError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for RagTraceError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let message = err.body_text();
                match missing_field(&message) {
                    Some(field) => {
                        RagTraceError::Validation(format!("Missing required field: {field}"))
                    }
                    None => RagTraceError::Validation(format!("Invalid JSON: {message}")),
                }
            }
            JsonRejection::JsonSyntaxError(err) => {
                RagTraceError::Validation(format!("JSON syntax error: {}", err.body_text()))
            }
            JsonRejection::MissingJsonContentType(_) => RagTraceError::Validation(
                "Missing `Content-Type: application/json` header".to_string(),
            ),
            JsonRejection::BytesRejection(_) => {
                RagTraceError::Internal("Failed to read request body".to_string())
            }
            other => RagTraceError::Validation(other.body_text()),
        }
    }
}

fn missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
