//! Tool-specific error types.

use serde_json::json;
use thiserror::Error;

use crate::domains::glassnode::UpstreamError;

/// Errors that can occur during tool operations.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The requested tool is not declared.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's declared parameters.
    #[error("Invalid argument '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Upstream reported the requested identifier as unknown.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The upstream call failed.
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "unknown tool" error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a new validation error for a given argument.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "not found" error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable kind, reported to MCP clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::Validation { .. } => "validation",
            Self::NotFound(_) => "not_found",
            Self::Upstream(e) => e.kind(),
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error concerns the request itself rather than its execution.
    ///
    /// Request errors are reported as protocol errors (`invalid_params`);
    /// execution errors are reported as tool results with `isError: true`.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::Validation { .. })
    }

    /// Structured representation used in tool results.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Upstream(e) => e.to_json(),
            Self::Validation { field, reason } => json!({
                "kind": self.kind(),
                "field": field,
                "message": reason,
            }),
            _ => json!({
                "kind": self.kind(),
                "message": self.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors() {
        assert!(ToolError::unknown_tool("nope").is_request_error());
        assert!(ToolError::validation("path", "must not be empty").is_request_error());
        assert!(!ToolError::not_found("metric").is_request_error());
        assert!(!ToolError::from(UpstreamError::network("down")).is_request_error());
    }

    #[test]
    fn test_to_json() {
        let err = ToolError::validation("assets", "must not be empty");
        assert_eq!(err.to_string(), "Invalid argument 'assets': must not be empty");
        let json = err.to_json();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["field"], "assets");

        let err = ToolError::from(UpstreamError::status(503, "maintenance"));
        let json = err.to_json();
        assert_eq!(json["kind"], "upstream");
        assert_eq!(json["status"], 503);

        assert_eq!(ToolError::not_found("x").to_json()["kind"], "not_found");
    }
}
