//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tools domain.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool.
//! Each tool implements `GlassnodeTool`:
//! - Parameters struct (deserialized and validated before any upstream call)
//! - Output struct (declared as the tool's output schema)
//! - `run()` (core logic, backed by the shared `GlassnodeClient`)
//!
//! The ToolRouter used by STDIO/TCP is built in `domains/tools/router.rs`;
//! the HTTP transport dispatches through the `ToolRegistry`.
//! **Adding a new tool does NOT require modifying this file!**

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use std::sync::Arc;

use super::config::Config;
use crate::domains::glassnode::GlassnodeClient;
use crate::domains::tools::{ToolError, ToolRegistry, build_tool_router};

const INSTRUCTIONS: &str = "Read-only access to Glassnode on-chain and market data. \
    Use get_assets_list and get_metrics_list to discover asset identifiers and metric paths, \
    get_metric_metadata to check which assets, intervals and currencies a metric supports, \
    then fetch_metric for one asset or fetch_bulk_metric for several. \
    Timestamps are Unix seconds.";

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp. It is cheap
/// to clone: every connection of the TCP transport gets its own copy.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Name-based dispatch, used by the HTTP transport.
    registry: ToolRegistry,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration and upstream client.
    pub fn new(config: Config, client: Arc<GlassnodeClient>) -> Self {
        Self {
            config: Arc::new(config),
            registry: ToolRegistry::new(client.clone()),
            tool_router: build_tool_router::<Self>(client),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Usage instructions advertised to clients on initialize.
    pub fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema,
                    "outputSchema": t.output_schema,
                    "annotations": t.annotations
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// Unknown tools and invalid arguments are returned as `Err`; upstream
    /// failures are folded into the result with `is_error` set.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ToolError> {
        self.registry.call_tool(name, arguments).await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}
