use crate::error::ProxyError;

/// Header carrying the caller credential on protected routes.
pub const API_KEY_HEADER: &str = "api_key";

/// Binary accept/reject check of a caller token against the process secret.
#[derive(Clone, Default)]
pub struct ApiKeyGate {
    secret: Option<Vec<u8>>,
}

impl ApiKeyGate {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(String::into_bytes),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Accepts only when a secret is configured and `supplied` matches it
    /// byte for byte. No secret means nothing is accepted.
    pub fn authorize(&self, supplied: Option<&[u8]>) -> Result<(), ProxyError> {
        match (&self.secret, supplied) {
            (Some(secret), Some(token)) if secret.as_slice() == token => Ok(()),
            _ => Err(ProxyError::Unauthorized),
        }
    }
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}
