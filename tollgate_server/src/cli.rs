use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tollgate_core::config::DEFAULT_TAVILY_BASE_URL;
use tollgate_core::{ProxyConfig, ProxyError};

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(about = "Tollgate - public and API-key protected Tavily search/extract, with MCP tool discovery")]
#[command(version)]
#[command(after_help = "\x1b[1;36mRoutes:\x1b[0m
  POST /search            Public search, no key
  POST /tavily-search     Search, requires the api_key header
  POST /tavily-extract    Extract, requires the api_key header
  POST /mcp               MCP JSON-RPC tool discovery, requires the api_key header
  GET  /mcp               MCP over SSE; messages go to /mcp/messages/?session_id=...
  GET  /health            Liveness")]
pub struct Cli {
    /// Secret callers must send in the `api_key` header. Unset locks every protected route.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Tavily API key used for all upstream calls (required)
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    pub tavily_api_key: String,

    /// Tavily API base URL
    #[arg(long, env = "TAVILY_BASE_URL", default_value = DEFAULT_TAVILY_BASE_URL)]
    pub tavily_base_url: String,

    /// Timeout for each upstream call, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Address to listen on
    #[arg(long, env = "TOLLGATE_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,
}

impl Cli {
    pub fn to_config(&self) -> Result<ProxyConfig, ProxyError> {
        ProxyConfig::new(self.tavily_api_key.clone())?
            .with_api_key(self.api_key.clone())
            .with_base_url(&self.tavily_base_url)?
            .with_timeout(Duration::from_secs(self.upstream_timeout_secs))
    }
}
