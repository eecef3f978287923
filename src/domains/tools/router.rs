//! Tool Router - builds the rmcp ToolRouter from the tool definitions.
//!
//! This module builds the ToolRouter for STDIO/TCP transport by delegating
//! to the tool definitions themselves. Each tool knows how to create its own route.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use super::definitions::{
    FetchBulkMetricTool, FetchMetricTool, GetAssetsListTool, GetMetricMetadataTool,
    GetMetricsListTool,
};
use crate::domains::glassnode::GlassnodeClient;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(client: Arc<GlassnodeClient>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(GetAssetsListTool::create_route(client.clone()))
        .with_route(GetMetricsListTool::create_route(client.clone()))
        .with_route(GetMetricMetadataTool::create_route(client.clone()))
        .with_route(FetchMetricTool::create_route(client.clone()))
        .with_route(FetchBulkMetricTool::create_route(client))
}
