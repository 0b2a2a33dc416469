use std::time::Duration;
use url::Url;

use crate::error::ProxyError;

pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide settings, built once at startup and handed to the gateway
/// and the upstream client. Nothing here changes after construction.
#[derive(Clone)]
pub struct ProxyConfig {
    /// Secret callers must present in the `api_key` header. `None` locks the
    /// protected routes entirely.
    pub api_key: Option<String>,
    /// Provider credential, sent as a bearer token. Never shown to callers.
    pub tavily_api_key: String,
    pub tavily_base_url: Url,
    pub upstream_timeout: Duration,
}

impl ProxyConfig {
    pub fn new(tavily_api_key: impl Into<String>) -> Result<Self, ProxyError> {
        let tavily_base_url = Url::parse(DEFAULT_TAVILY_BASE_URL)
            .map_err(|e| ProxyError::Config(format!("invalid default base url: {}", e)))?;
        let config = Self {
            api_key: None,
            tavily_api_key: tavily_api_key.into(),
            tavily_base_url,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ProxyError> {
        self.tavily_base_url = Url::parse(base_url)
            .map_err(|e| ProxyError::Config(format!("invalid Tavily base url '{}': {}", base_url, e)))?;
        self.validate()?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProxyError> {
        self.upstream_timeout = timeout;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.tavily_api_key.trim().is_empty() {
            return Err(ProxyError::Config(
                "TAVILY_API_KEY environment variable is required".into(),
            ));
        }
        match self.tavily_base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ProxyError::Config(format!(
                    "Tavily base url must be http or https, got '{}'",
                    other
                )))
            }
        }
        if self.upstream_timeout.is_zero() {
            return Err(ProxyError::Config(
                "upstream timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// Hand-written so secrets never reach a log line through `{:?}`.
impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("tavily_api_key", &"<redacted>")
            .field("tavily_base_url", &self.tavily_base_url.as_str())
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}
