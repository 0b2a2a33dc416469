//! Route handlers. Each one is a thin shell over the gateway.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tollgate_core::mcp_server::parse_error_response;
use tollgate_core::API_KEY_HEADER;

use crate::{error::ApiResult, state::AppState};

pub(crate) fn api_key(headers: &HeaderMap) -> Option<&[u8]> {
    headers.get(API_KEY_HEADER).map(|v| v.as_bytes())
}

// Content type is not enforced; whatever arrives must be a JSON document.
fn parse_body(body: &Bytes) -> ApiResult<Value> {
    Ok(serde_json::from_slice(body)?)
}

/// `POST /search` - public tier, no key.
pub async fn public_search(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let body = parse_body(&body)?;
    Ok(Json(state.gateway.public_search(body).await?))
}

/// `POST /tavily-search`
pub async fn tavily_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let key = api_key(&headers);
    state.gateway.authorize(key)?;
    let body = parse_body(&body)?;
    Ok(Json(state.gateway.protected_search(key, body).await?))
}

/// `POST /tavily-extract`
pub async fn tavily_extract(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let key = api_key(&headers);
    state.gateway.authorize(key)?;
    let body = parse_body(&body)?;
    Ok(Json(state.gateway.protected_extract(key, body).await?))
}

/// `POST /mcp` - JSON-RPC tool discovery behind the same key as the
/// protected routes.
pub async fn mcp(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let key = api_key(&headers);
    state.gateway.authorize(key)?;

    let request: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(parse_error_response(&e.to_string())),
            )
                .into_response())
        }
    };

    match state.mcp.handle(key, request).await? {
        Some(reply) => Ok(Json(reply).into_response()),
        None => Ok(StatusCode::ACCEPTED.into_response()),
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.uptime_seconds(),
        "protected_routes_enabled": state.gateway.gate().is_configured(),
    }))
}
