//! Glassnode metric metadata tool.
//!
//! Describes one metric: tier, supported assets, intervals and currencies.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{normalize_asset, normalize_metric_path};
use crate::domains::glassnode::{GlassnodeClient, MetricMetadata};
use crate::domains::tools::ToolError;
use crate::domains::tools::handlers::{GlassnodeTool, Validate, create_route, tool_model};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetMetricMetadataParams {
    /// Metric path, e.g. "/market/price_usd_close"
    pub path: String,

    /// Optional asset identifier for asset-specific metadata (e.g. "BTC")
    #[serde(default)]
    pub asset: Option<String>,
}

impl Validate for GetMetricMetadataParams {
    fn validate(self) -> Result<Self, ToolError> {
        let path = normalize_metric_path("path", &self.path)?;
        let asset = match self.asset.as_deref() {
            Some(raw) => Some(normalize_asset("asset", raw)?),
            None => None,
        };
        Ok(Self { path, asset })
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct MetricMetadataResult {
    /// Normalized metric path, with a leading slash.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    pub metadata: MetricMetadata,
}

pub struct GetMetricMetadataTool;

impl GetMetricMetadataTool {
    /// Fetch metadata for a metric.
    ///
    /// A 404 or an empty answer means the metric (or the metric/asset pair)
    /// does not exist and is reported as `NotFound`.
    pub async fn fetch(
        client: &GlassnodeClient,
        params: GetMetricMetadataParams,
    ) -> Result<MetricMetadataResult, ToolError> {
        let path = format!("/{}", params.path);
        let what = match &params.asset {
            Some(asset) => format!("metric {} for asset {}", path, asset),
            None => format!("metric {}", path),
        };

        let metadata = match client.metric_metadata(&params.path, params.asset.as_deref()).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => return Err(ToolError::not_found(what)),
            Err(e) if e.is_not_found() => return Err(ToolError::not_found(what)),
            Err(e) => return Err(e.into()),
        };

        Ok(MetricMetadataResult {
            path,
            asset: params.asset,
            metadata,
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

impl GlassnodeTool for GetMetricMetadataTool {
    const NAME: &'static str = "get_metric_metadata";

    const DESCRIPTION: &'static str = "Get metadata for a specific Glassnode metric: access tier, \
        supported assets, intervals, currencies and formats. Pass 'asset' to get the metadata \
        specific to that asset.";

    type Params = GetMetricMetadataParams;
    type Output = MetricMetadataResult;

    fn run(
        client: Arc<GlassnodeClient>,
        params: Self::Params,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
        async move { Self::fetch(&client, params).await }.boxed()
    }

    fn summarize(output: &Self::Output) -> String {
        match &output.asset {
            Some(asset) => format!("Metadata for {} ({})", output.path, asset),
            None => format!("Metadata for {}", output.path),
        }
    }
}
