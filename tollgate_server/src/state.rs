//! Application state shared by every handler

use std::sync::Arc;
use std::time::Instant;
use tollgate_core::{Gateway, McpServer, ProxyConfig, ProxyError};

use crate::sse::SseSessions;

/// Cloned per request. Only the SSE session table changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub mcp: Arc<McpServer>,
    pub sessions: SseSessions,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        Ok(Self::with_gateway(Gateway::from_config(config)?))
    }

    pub fn with_gateway(gateway: Gateway) -> Self {
        let gateway = Arc::new(gateway);
        Self {
            mcp: Arc::new(McpServer::new(gateway.clone())),
            gateway,
            sessions: SseSessions::default(),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
