//! Glassnode metrics catalog tool.
//!
//! Lists every metric path the Glassnode API exposes.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domains::glassnode::GlassnodeClient;
use crate::domains::tools::ToolError;
use crate::domains::tools::handlers::{GlassnodeTool, Validate, create_route, tool_model};

/// The metrics list takes no arguments.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetMetricsListParams {}

impl Validate for GetMetricsListParams {
    fn validate(self) -> Result<Self, ToolError> {
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct MetricsListResult {
    /// Metric paths, e.g. `/market/price_usd_close`.
    pub metrics: Vec<String>,
    pub total_count: usize,
}

pub struct GetMetricsListTool;

impl GetMetricsListTool {
    /// List all metric paths.
    pub async fn fetch(client: &GlassnodeClient) -> Result<MetricsListResult, ToolError> {
        let metrics = client.metrics().await?;
        Ok(MetricsListResult {
            total_count: metrics.len(),
            metrics,
        })
    }

    pub fn to_tool() -> Tool {
        tool_model::<Self>()
    }

    pub fn create_route<S>(client: Arc<GlassnodeClient>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        create_route::<Self, S>(client)
    }
}

impl GlassnodeTool for GetMetricsListTool {
    const NAME: &'static str = "get_metrics_list";

    const DESCRIPTION: &'static str = "Get a list of all metrics available from the Glassnode API. \
        Returns metric paths (e.g. '/market/price_usd_close') that can be passed to \
        get_metric_metadata, fetch_metric and fetch_bulk_metric.";

    type Params = GetMetricsListParams;
    type Output = MetricsListResult;

    fn run(
        client: Arc<GlassnodeClient>,
        _params: Self::Params,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
        async move { Self::fetch(&client).await }.boxed()
    }

    fn summarize(output: &Self::Output) -> String {
        format!("Found {} metric(s)", output.total_count)
    }
}
