//! HTTP mapping of proxy failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;
use tollgate_core::error::{INVALID_API_KEY_MESSAGE, UPSTREAM_ERROR_MESSAGE};
use tollgate_core::{FieldError, ProxyError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("JSON decode error: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

fn field_detail(errors: &[FieldError]) -> Value {
    let items: Vec<Value> = errors
        .iter()
        .map(|e| {
            let loc = if e.field.is_empty() {
                json!(["body"])
            } else {
                json!(["body", e.field])
            };
            json!({"loc": loc, "msg": e.message, "type": e.kind})
        })
        .collect();
    Value::Array(items)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::MalformedBody(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!([{"loc": ["body"], "msg": self.to_string(), "type": "json_invalid", "col": e.column()}]),
            ),
            ApiError::Proxy(ProxyError::Unauthorized) => {
                (StatusCode::FORBIDDEN, json!(INVALID_API_KEY_MESSAGE))
            }
            ApiError::Proxy(ProxyError::Validation(errors)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, field_detail(errors))
            }
            ApiError::Proxy(e) if e.is_upstream() => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!(UPSTREAM_ERROR_MESSAGE),
            ),
            ApiError::Proxy(e) => {
                error!(code = e.code_str(), "request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!(e.caller_message()))
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;
