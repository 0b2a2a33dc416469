use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::ApiKeyGate;
use crate::client::{Endpoint, TavilyClient, Upstream};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::routes::Route;
use crate::schema::{ExtractRequest, SearchRequest};

/// Ties the credential gate, request validation and the upstream client
/// together. Stateless: every call is one check, one validation and at most
/// one upstream request.
#[derive(Clone)]
pub struct Gateway {
    gate: ApiKeyGate,
    upstream: Arc<dyn Upstream>,
}

impl Gateway {
    pub fn new(gate: ApiKeyGate, upstream: Arc<dyn Upstream>) -> Self {
        Self { gate, upstream }
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let client = TavilyClient::new(config)?;
        Ok(Self::new(
            ApiKeyGate::new(config.api_key.clone()),
            Arc::new(client),
        ))
    }

    pub fn gate(&self) -> &ApiKeyGate {
        &self.gate
    }

    pub fn authorize(&self, api_key: Option<&[u8]>) -> Result<(), ProxyError> {
        self.gate.authorize(api_key)
    }

    pub async fn public_search(&self, body: Value) -> Result<Value, ProxyError> {
        self.dispatch(Route::PublicSearch, None, body).await
    }

    pub async fn protected_search(
        &self,
        api_key: Option<&[u8]>,
        body: Value,
    ) -> Result<Value, ProxyError> {
        self.dispatch(Route::ProtectedSearch, api_key, body).await
    }

    pub async fn protected_extract(
        &self,
        api_key: Option<&[u8]>,
        body: Value,
    ) -> Result<Value, ProxyError> {
        self.dispatch(Route::ProtectedExtract, api_key, body).await
    }

    /// Common path for every route: gate (if the route needs it), validate,
    /// forward. Nothing reaches the provider unless both checks pass.
    pub async fn dispatch(
        &self,
        route: Route,
        api_key: Option<&[u8]>,
        body: Value,
    ) -> Result<Value, ProxyError> {
        if route.requires_api_key() {
            self.gate.authorize(api_key)?;
        }

        let payload = match route.endpoint() {
            Endpoint::Search => serde_json::to_value(SearchRequest::from_value(body)?)?,
            Endpoint::Extract => serde_json::to_value(ExtractRequest::from_value(body)?)?,
        };

        match self.upstream.post(route.endpoint(), payload).await {
            Ok(value) => {
                info!(route = route.path(), "Tavily call succeeded");
                Ok(value)
            }
            Err(ProxyError::Upstream { status, body }) => {
                warn!(route = route.path(), status, body = %body, "Tavily returned an error");
                Err(ProxyError::Upstream { status, body })
            }
            Err(e) => {
                warn!(route = route.path(), error = %e, "Tavily call failed");
                Err(e)
            }
        }
    }
}
