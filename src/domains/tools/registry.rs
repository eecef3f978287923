//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - Dispatch by tool name, used by the HTTP transport and by tests
//! - Tool metadata for listing

use std::sync::Arc;

use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;
use tracing::warn;

use super::definitions::{
    FetchBulkMetricTool, FetchMetricTool, GetAssetsListTool, GetMetricMetadataTool,
    GetMetricsListTool,
};
use super::error::ToolError;
use super::handlers::{self, GlassnodeTool};
use crate::domains::glassnode::GlassnodeClient;

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
///
/// This struct provides a central point for:
/// - Listing all available tools
/// - Dispatching tool calls by name
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    client: Arc<GlassnodeClient>,
}

impl ToolRegistry {
    /// Create a new tool registry backed by the given client.
    pub fn new(client: Arc<GlassnodeClient>) -> Self {
        Self { client }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            GetAssetsListTool::NAME,
            GetMetricsListTool::NAME,
            GetMetricMetadataTool::NAME,
            FetchMetricTool::NAME,
            FetchBulkMetricTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// This is the single source of truth for all available tools.
    /// Both HTTP and STDIO/TCP transports use this to get tool metadata.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            GetAssetsListTool::to_tool(),
            GetMetricsListTool::to_tool(),
            GetMetricMetadataTool::to_tool(),
            FetchMetricTool::to_tool(),
            FetchBulkMetricTool::to_tool(),
        ]
    }

    /// Run a tool by name and return its payload.
    ///
    /// Arguments are validated before any upstream call is made.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let client = self.client.clone();
        match name {
            GetAssetsListTool::NAME => {
                handlers::dispatch::<GetAssetsListTool>(client, arguments).await
            }
            GetMetricsListTool::NAME => {
                handlers::dispatch::<GetMetricsListTool>(client, arguments).await
            }
            GetMetricMetadataTool::NAME => {
                handlers::dispatch::<GetMetricMetadataTool>(client, arguments).await
            }
            FetchMetricTool::NAME => {
                handlers::dispatch::<FetchMetricTool>(client, arguments).await
            }
            FetchBulkMetricTool::NAME => {
                handlers::dispatch::<FetchBulkMetricTool>(client, arguments).await
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(ToolError::unknown_tool(name))
            }
        }
    }

    /// Dispatch a transport tool call to the appropriate handler.
    ///
    /// Unknown tools and invalid arguments are returned as `Err`; upstream
    /// failures come back as a `CallToolResult` with `is_error` set.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, ToolError> {
        let client = self.client.clone();
        match name {
            GetAssetsListTool::NAME => {
                handlers::call::<GetAssetsListTool>(client, arguments).await
            }
            GetMetricsListTool::NAME => {
                handlers::call::<GetMetricsListTool>(client, arguments).await
            }
            GetMetricMetadataTool::NAME => {
                handlers::call::<GetMetricMetadataTool>(client, arguments).await
            }
            FetchMetricTool::NAME => {
                handlers::call::<FetchMetricTool>(client, arguments).await
            }
            FetchBulkMetricTool::NAME => {
                handlers::call::<FetchBulkMetricTool>(client, arguments).await
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(ToolError::unknown_tool(name))
            }
        }
    }
}
