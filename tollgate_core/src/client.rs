use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ProxyConfig;
use crate::error::ProxyError;

/// The two provider operations this proxy knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Search,
    Extract,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Search => "/search",
            Endpoint::Extract => "/extract",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Search => "search",
            Endpoint::Extract => "extract",
        }
    }
}

/// Anything that can carry a validated payload to the provider.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// One POST, no retries. Returns the provider body untouched on 200.
    async fn post(&self, endpoint: Endpoint, payload: Value) -> Result<Value, ProxyError>;
}

pub struct TavilyClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl TavilyClient {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .user_agent(concat!("tollgate/", env!("CARGO_PKG_VERSION")))
            .timeout(config.upstream_timeout)
            .build()
            .map_err(ProxyError::HttpRequest)?;
        Ok(Self {
            client,
            base_url: config.tavily_base_url.clone(),
            api_key: config.tavily_api_key.clone(),
        })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, ProxyError> {
        // Keep any path prefix on the base url (e.g. a staging mount).
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, endpoint.path()))
            .map_err(|e| ProxyError::Config(format!("invalid {} url: {}", endpoint.name(), e)))
    }

    fn get_headers(&self) -> Result<HeaderMap, ProxyError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ProxyError::Config(format!("provider key is not a valid header: {}", e)))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl Upstream for TavilyClient {
    async fn post(&self, endpoint: Endpoint, payload: Value) -> Result<Value, ProxyError> {
        let url = self.endpoint_url(endpoint)?;
        debug!(endpoint = endpoint.name(), %url, "calling Tavily");

        let resp = self
            .client
            .post(url)
            .headers(self.get_headers()?)
            .json(&payload)
            .send()
            .await
            .map_err(ProxyError::HttpRequest)?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>().await.map_err(ProxyError::HttpRequest)
    }
}
