//! Upstream (Glassnode API) error types.

use std::time::Duration;

use serde_json::json;
use thiserror::Error;

/// Maximum number of characters of an upstream error body kept in messages.
const MAX_MESSAGE_LEN: usize = 512;

/// Errors that can occur while talking to the Glassnode API.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The request never produced a response (DNS, connect, TLS, reset...).
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Upstream answered with a non-success HTTP status.
    #[error("Upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded into the expected shape.
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Create a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a status error, truncating very long upstream bodies.
    pub fn status(status: u16, body: impl AsRef<str>) -> Self {
        let body = body.as_ref().trim();
        let message = if body.is_empty() {
            "<empty body>".to_string()
        } else if body.chars().count() > MAX_MESSAGE_LEN {
            let head: String = body.chars().take(MAX_MESSAGE_LEN).collect();
            format!("{}...", head)
        } else {
            body.to_string()
        };
        Self::Status { status, message }
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Short machine-readable kind, reported to MCP clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "upstream",
            Self::Decode(_) => "decode",
        }
    }

    /// HTTP status code, if upstream answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether upstream reported the requested identifier as unknown.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Whether upstream asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }

    /// Structured representation used in tool results.
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Some(status) = self.status_code() {
            body["status"] = json!(status);
        }
        body
    }
}
