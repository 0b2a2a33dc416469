use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tollgate_core::{ApiKeyGate, Endpoint, Gateway, ProxyError, Upstream};

pub const CALLER_KEY: &str = "caller-secret";

pub enum Reply {
    Json(Value),
    Status(u16, &'static str),
}

/// Fake provider that remembers every payload it was sent.
pub struct RecordingUpstream {
    calls: Mutex<Vec<(Endpoint, Value)>>,
    reply: Reply,
}

impl RecordingUpstream {
    pub fn replying(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn calls(&self) -> Vec<(Endpoint, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn post(&self, endpoint: Endpoint, payload: Value) -> Result<Value, ProxyError> {
        self.calls.lock().unwrap().push((endpoint, payload));
        match &self.reply {
            Reply::Json(v) => Ok(v.clone()),
            Reply::Status(status, body) => Err(ProxyError::Upstream {
                status: *status,
                body: body.to_string(),
            }),
        }
    }
}

pub fn gateway(upstream: Arc<RecordingUpstream>) -> Gateway {
    Gateway::new(ApiKeyGate::new(Some(CALLER_KEY.into())), upstream)
}
