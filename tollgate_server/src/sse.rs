//! MCP over server-sent events
//!
//! `GET /mcp` opens an event stream whose first `endpoint` event names the
//! URL to POST JSON-RPC messages to. Replies come back on the stream as
//! `message` events. Both legs sit behind the same `api_key` gate as the
//! protected routes.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tollgate_core::mcp_server::parse_error_response;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{error::ApiResult, handlers::api_key, state::AppState};

pub const MESSAGES_PATH: &str = "/mcp/messages/";

const SESSION_BUFFER: usize = 32;

type Sessions = HashMap<String, mpsc::Sender<Value>>;

/// Open SSE sessions by id.
#[derive(Clone, Default)]
pub struct SseSessions {
    inner: Arc<Mutex<Sessions>>,
}

impl SseSessions {
    fn open(&self) -> (String, mpsc::Receiver<Value>, SessionGuard) {
        let id = Uuid::new_v4().simple().to_string();
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.lock().insert(id.clone(), tx);
        let guard = SessionGuard {
            sessions: self.clone(),
            id: id.clone(),
        };
        (id, rx, guard)
    }

    fn sender(&self, id: &str) -> Option<mpsc::Sender<Value>> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        // The map stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Removes the session once its stream is dropped.
struct SessionGuard {
    sessions: SseSessions,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.lock().remove(&self.id);
        debug!(session = %self.id, "SSE session closed");
    }
}

/// `GET /mcp`
pub async fn connect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    state.gateway.authorize(api_key(&headers))?;

    let (id, rx, guard) = state.sessions.open();
    info!(session = %id, "SSE session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?session_id={}", MESSAGES_PATH, id));
    let replies = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let reply = rx.recv().await?;
        let event = Event::default().event("message").data(reply.to_string());
        Some((event, (rx, guard)))
    });
    let events = stream::once(async move { endpoint })
        .chain(replies)
        .map(Ok);

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// `POST /mcp/messages/?session_id=...`
pub async fn message(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let key = api_key(&headers);
    state.gateway.authorize(key)?;

    let Some(sender) = params
        .get("session_id")
        .and_then(|id| state.sessions.sender(id))
    else {
        return Ok(session_not_found());
    };

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

    if let Some(reply) = state.mcp.handle(key, request).await? {
        if sender.send(reply).await.is_err() {
            warn!("SSE client disconnected before its reply was delivered");
            return Ok(session_not_found());
        }
    }

    Ok(StatusCode::ACCEPTED.into_response())
}

fn session_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"detail": "Could not find session"})),
    )
        .into_response()
}
