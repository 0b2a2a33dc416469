// src/error.rs
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Message surfaced to callers for every upstream or transport failure.
pub const UPSTREAM_ERROR_MESSAGE: &str = "Tavily API error";

/// Message surfaced to callers when the `api_key` header is missing or wrong.
pub const INVALID_API_KEY_MESSAGE: &str = "Invalid API key";

/// One declared field that failed its required/type/enum constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub kind: &'static str,
}

impl FieldError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: "Field required".to_string(),
            kind: "missing",
        }
    }

    pub fn invalid(field: &str, err: &serde_json::Error) -> Self {
        Self {
            field: field.to_string(),
            message: err.to_string(),
            kind: "invalid",
        }
    }

    pub fn body(message: impl Into<String>) -> Self {
        Self {
            field: String::new(),
            message: message.into(),
            kind: "body",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{}", INVALID_API_KEY_MESSAGE)]
    Unauthorized,

    #[error("Invalid request: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Tavily API returned status {status}")]
    Upstream { status: u16, body: String },

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ProxyError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ProxyError::Unauthorized => "auth_failed",
            ProxyError::Validation(_) => "invalid_input",
            ProxyError::Upstream { .. } => "upstream_error",
            ProxyError::HttpRequest(e) if e.is_timeout() => "timeout",
            ProxyError::HttpRequest(_) => "upstream_error",
            ProxyError::SerdeJson(_) => "parse_error",
            ProxyError::Config(_) => "config_error",
            ProxyError::ToolNotFound(_) => "tool_not_found",
            ProxyError::InvalidParams(_) => "invalid_params",
            ProxyError::MethodNotFound(_) => "method_not_found",
            ProxyError::InternalError(_) => "internal_error",
        }
    }

    /// True for failures that happened on the way to, or at, the provider.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ProxyError::Upstream { .. } | ProxyError::HttpRequest(_)
        )
    }

    /// The text a caller is allowed to see. Provider status, provider body and
    /// transport detail stay server-side.
    pub fn caller_message(&self) -> String {
        match self {
            ProxyError::Unauthorized => INVALID_API_KEY_MESSAGE.to_string(),
            e if e.is_upstream() => UPSTREAM_ERROR_MESSAGE.to_string(),
            ProxyError::Config(_) | ProxyError::InternalError(_) => {
                "Internal server error".to_string()
            }
            e => e.to_string(),
        }
    }

    pub fn to_jsonrpc_error(&self) -> serde_json::Value {
        let code = match self {
            ProxyError::Validation(_)
            | ProxyError::InvalidParams(_)
            | ProxyError::ToolNotFound(_) => -32602,
            ProxyError::MethodNotFound(_) => -32601,
            ProxyError::SerdeJson(_) => -32700,
            _ => -32603,
        };

        match self {
            ProxyError::Validation(errors) => json!({
                "code": code,
                "message": self.caller_message(),
                "data": errors,
            }),
            _ => json!({
                "code": code,
                "message": self.caller_message(),
            }),
        }
    }
}
