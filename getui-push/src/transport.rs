//! Transport seam between the client and the gateway.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::{GetuiConfig, PushError, Result};

/// Marker the gateway puts in `result` when a signature is invalid or expired.
pub const SIGN_ERROR: &str = "sign_error";

/// A gateway answer.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body; non-JSON bodies are kept as a string value.
    pub body: Value,
}

impl GatewayReply {
    /// Create a reply.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Create a 200 reply.
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// Get the `result` field.
    pub fn result(&self) -> Option<&str> {
        self.body.get("result").and_then(Value::as_str)
    }

    /// Check for the rejection marker.
    pub fn is_sign_error(&self) -> bool {
        self.result() == Some(SIGN_ERROR)
    }

    /// Turn the reply into its body, or an error for non-200 statuses.
    pub fn into_body(self) -> Result<Value> {
        if self.status == 200 {
            Ok(self.body)
        } else {
            Err(PushError::UpstreamStatus {
                status: self.status,
                body: self.body.to_string(),
            })
        }
    }
}

/// Sends one JSON request to the gateway.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post a JSON body and return the gateway answer.
    async fn post(&self, body: &Value) -> Result<GatewayReply>;
}

/// HTTP transport over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint.
    pub fn new(config: &GetuiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PushError::Config(e.to_string()))?;

        Ok(Self::with_client(client, config.endpoint.clone()))
    }

    /// Create a transport from an existing client.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, body: &Value) -> Result<GatewayReply> {
        let action = body
            .get("action")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        debug!(endpoint = %self.endpoint, action, "Posting to gateway");

        let response = self.client.post(&self.endpoint).json(body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(GatewayReply::new(status, body))
    }
}
