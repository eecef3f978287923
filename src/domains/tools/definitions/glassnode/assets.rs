//! Glassnode assets list tool.
//!
//! Lists every asset the Glassnode API supports.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domains::glassnode::{Asset, GlassnodeClient};
use crate::domains::tools::ToolError;
use crate::domains::tools::handlers::{GlassnodeTool, Validate, create_route, tool_model};

// ============================================================================
// Tool Parameters
// ============================================================================

/// The assets list takes no arguments.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetAssetsListParams {}

impl Validate for GetAssetsListParams {
    fn validate(self) -> Result<Self, ToolError> {
        Ok(self)
    }
}

// ============================================================================
// Structured Output
// ============================================================================

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AssetsListResult {
    pub assets: Vec<Asset>,
    pub total_count: usize,
}

// ============================================================================
// Tool Implementation
// ============================================================================

pub struct GetAssetsListTool;

impl GetAssetsListTool {
    /// List the assets supported by Glassnode.
    pub async fn fetch(client: &GlassnodeClient) -> Result<AssetsListResult, ToolError> {
        let assets = client.assets().await?;
        Ok(AssetsListResult {
            total_count: assets.len(),
            assets,
        })
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<Self>()
    }

    /// Create a ToolRoute for STDIO/TCP transport.
    pub fn create_route<S>(client: Arc<GlassnodeClient>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        create_route::<Self, S>(client)
    }
}

impl GlassnodeTool for GetAssetsListTool {
    const NAME: &'static str = "get_assets_list";

    const DESCRIPTION: &'static str = "Get a list of all assets supported by the Glassnode API. \
        Returns each asset's identifier (use it as the 'asset' argument of the fetch tools), \
        symbol, name and any further metadata Glassnode provides.";

    type Params = GetAssetsListParams;
    type Output = AssetsListResult;

    fn run(
        client: Arc<GlassnodeClient>,
        _params: Self::Params,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
        async move { Self::fetch(&client).await }.boxed()
    }

    fn summarize(output: &Self::Output) -> String {
        format!("Found {} asset(s) supported by Glassnode", output.total_count)
    }
}
