//! Router definition

use axum::{
    routing::{get, post},
    Router,
};
use tollgate_core::Route;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, sse, state::AppState};

pub const MCP_PATH: &str = "/mcp";

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(Route::PublicSearch.path(), post(handlers::public_search))
        .route(Route::ProtectedSearch.path(), post(handlers::tavily_search))
        .route(Route::ProtectedExtract.path(), post(handlers::tavily_extract))
        .route(MCP_PATH, get(sse::connect).post(handlers::mcp))
        .route(sse::MESSAGES_PATH, post(sse::message))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        // Any origin, method and header; the public route is meant to be
        // called straight from browsers.
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
