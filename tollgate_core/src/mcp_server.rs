use rmcp::model::*;
use schemars::JsonSchema;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    client::Endpoint,
    error::{ProxyError, UPSTREAM_ERROR_MESSAGE},
    gateway::Gateway,
    routes::Route,
    schema::{ExtractRequest, SearchRequest, SearchResponse},
};

/// MCP tool-discovery server over the protected routes.
///
/// It only knows about [`Route::discoverable`] and the [`Gateway`]; the
/// transport (HTTP, stdio, ...) lives elsewhere and hands it one decoded
/// JSON-RPC message at a time together with the caller's key.
pub struct McpServer {
    gateway: Arc<Gateway>,
}

impl McpServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub fn get_capabilities(&self) -> ServerCapabilities {
        ServerCapabilities::builder().enable_tools().build()
    }

    pub async fn handle_initialize(
        &self,
        request: InitializeRequestParam,
    ) -> Result<InitializeResult, ProxyError> {
        info!(client = %request.client_info.name, "MCP client initializing");

        Ok(InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: self.get_capabilities(),
            server_info: Implementation {
                name: "tollgate".to_string(),
                title: Some("Tavily Protected MCP".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some("Use 'tavily_search' for web/news search and 'tavily_extract' to pull page content from URLs.".to_string()),
        })
    }

    /// One tool per protected route.
    pub async fn handle_list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ProxyError> {
        let output_schema = schema_object::<SearchResponse>()?;
        let tools = Route::discoverable()
            .map(|route| -> Result<Tool, ProxyError> {
                let input_schema = match route.endpoint() {
                    Endpoint::Search => schema_object::<SearchRequest>()?,
                    Endpoint::Extract => schema_object::<ExtractRequest>()?,
                };
                Ok(Tool {
                    name: Cow::Borrowed(route.tool_name()),
                    title: None,
                    description: Some(Cow::Borrowed(route.description())),
                    input_schema,
                    output_schema: Some(output_schema.clone()),
                    annotations: None,
                    icons: None,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    /// Runs a discovered tool through the same gateway path as its HTTP route.
    pub async fn handle_call_tool(
        &self,
        api_key: Option<&[u8]>,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ProxyError> {
        let route = Route::from_tool_name(request.name.as_ref())
            .ok_or_else(|| ProxyError::ToolNotFound(request.name.to_string()))?;
        let args = Value::Object(request.arguments.unwrap_or_default());

        match self.gateway.dispatch(route, api_key, args).await {
            Ok(value) => structured_result(value),
            // Provider trouble is a tool-level failure, not a protocol error.
            Err(e) if e.is_upstream() => Ok(CallToolResult {
                content: vec![Content::text(UPSTREAM_ERROR_MESSAGE)],
                structured_content: None,
                is_error: Some(true),
                meta: None,
            }),
            Err(e) => Err(e),
        }
    }

    /// Process one JSON-RPC message. The credential check runs before the
    /// message is even looked at; `Err` is only ever `Unauthorized`.
    /// Notifications produce `Ok(None)`.
    pub async fn handle(
        &self,
        api_key: Option<&[u8]>,
        request: Value,
    ) -> Result<Option<Value>, ProxyError> {
        self.gateway.authorize(api_key)?;
        debug!("Handling JSON-RPC request: {:?}", request);

        let Some(message) = request.as_object() else {
            return Ok(Some(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32600, "message": "Invalid Request"},
                "id": null,
            })));
        };

        let method = message.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let Some(id) = message.get("id").cloned() else {
            debug!(method, "notification acknowledged");
            return Ok(None);
        };
        let params = message.get("params").cloned().unwrap_or(json!({}));

        let result = match method {
            "initialize" => match serde_json::from_value::<InitializeRequestParam>(params) {
                Ok(req) => self.handle_initialize(req).await.and_then(to_value),
                Err(e) => Err(ProxyError::InvalidParams(e.to_string())),
            },
            "ping" => Ok(json!({})),
            "tools/list" => match serde_json::from_value::<Option<PaginatedRequestParam>>(params) {
                Ok(req) => self.handle_list_tools(req).await.and_then(to_value),
                Err(e) => Err(ProxyError::InvalidParams(e.to_string())),
            },
            "tools/call" => match serde_json::from_value::<CallToolRequestParam>(params) {
                Ok(req) => self.handle_call_tool(api_key, req).await.and_then(to_value),
                Err(e) => Err(ProxyError::InvalidParams(e.to_string())),
            },
            other => Err(ProxyError::MethodNotFound(other.to_string())),
        };

        Ok(Some(match result {
            Ok(result) => json!({
                "jsonrpc": "2.0",
                "result": result,
                "id": id,
            }),
            Err(error) => {
                warn!(method, code = error.code_str(), "MCP request failed: {}", error);
                json!({
                    "jsonrpc": "2.0",
                    "error": error.to_jsonrpc_error(),
                    "id": id,
                })
            }
        }))
    }
}

/// JSON-RPC reply for a body that is not JSON at all.
pub fn parse_error_response(detail: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": {
            "code": -32700,
            "message": "Parse error",
            "data": detail,
        },
        "id": null
    })
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, ProxyError> {
    serde_json::to_value(value).map_err(ProxyError::SerdeJson)
}

fn schema_object<T: JsonSchema>() -> Result<Arc<JsonObject>, ProxyError> {
    match serde_json::to_value(schemars::schema_for!(T))? {
        Value::Object(map) => Ok(Arc::new(map)),
        _ => Err(ProxyError::InternalError(
            "generated schema is not an object".into(),
        )),
    }
}

fn structured_result(value: Value) -> Result<CallToolResult, ProxyError> {
    let text = serde_json::to_string(&value)?;
    // Only attach structured content that matches the advertised output schema.
    let fits = value.is_object() && SearchResponse::from_value(value.clone()).is_ok();
    let structured = fits.then_some(value);
    Ok(CallToolResult {
        content: vec![Content::text(text)],
        structured_content: structured,
        is_error: Some(false),
        meta: None,
    })
}
