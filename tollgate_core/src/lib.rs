// src/lib.rs
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mcp_server;
pub mod routes;
pub mod schema;

// Re-export the rmcp types that show up in this crate's public API
pub use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, InitializeRequestParam, InitializeResult,
    ListToolsResult, PaginatedRequestParam, ServerCapabilities, Tool,
};

pub use crate::auth::{ApiKeyGate, API_KEY_HEADER};
pub use crate::client::{Endpoint, TavilyClient, Upstream};
pub use crate::config::ProxyConfig;
pub use crate::error::{FieldError, ProxyError};
pub use crate::gateway::Gateway;
pub use crate::mcp_server::McpServer;
pub use crate::routes::Route;
pub use crate::schema::{ExtractRequest, SearchRequest, SearchResponse};
