//! Glassnode bulk metric tool.
//!
//! Fetches one metric for several assets. Each asset is one upstream call;
//! calls run concurrently, bounded by the client's bulk concurrency. A
//! failing asset does not fail the others: the result carries per-asset
//! status and errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, stream};
use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::common::{
    normalize_asset_list, normalize_metric_path, validate_extra_params, validate_time_range,
};
use crate::domains::glassnode::{
    Currency, GlassnodeClient, Interval, MetricDataRequest, Observation, UpstreamError,
};
use crate::domains::tools::ToolError;
use crate::domains::tools::handlers::{GlassnodeTool, Validate, create_route, tool_model};

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FetchBulkMetricParams {
    /// Metric path, e.g. "/market/price_usd_close"
    pub path: String,

    /// Asset identifiers, e.g. ["BTC", "ETH"] (duplicates are ignored, at most 50)
    pub assets: Vec<String>,

    /// Start of the range, Unix timestamp in seconds. Clamped to the
    /// longest window allowed for the interval.
    #[serde(default)]
    pub since: Option<i64>,

    /// End of the range, Unix timestamp in seconds (default: now)
    #[serde(default)]
    pub until: Option<i64>,

    /// Resolution: "10m", "1h", "24h" (default), "1w" or "1month"
    #[serde(default)]
    pub interval: Interval,

    /// Denomination for monetary metrics: "native" or "usd"
    #[serde(default)]
    pub currency: Option<Currency>,

    /// Additional upstream query parameters, passed through verbatim
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl Validate for FetchBulkMetricParams {
    fn validate(self) -> Result<Self, ToolError> {
        let path = normalize_metric_path("path", &self.path)?;
        let assets = normalize_asset_list("assets", &self.assets)?;
        validate_time_range(self.since, self.until)?;
        validate_extra_params("params", &self.params)?;
        Ok(Self {
            path,
            assets,
            ..self
        })
    }
}

/// Resolved time range of a bulk fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkWindow {
    pub since: i64,
    pub until: i64,
    /// Whether the requested `since` was moved forward to fit the window.
    pub clamped: bool,
}

impl BulkWindow {
    /// Resolve the range for `interval`, relative to `now` when `until` is absent.
    pub fn resolve(
        interval: Interval,
        since: Option<i64>,
        until: Option<i64>,
        now: i64,
    ) -> Result<Self, ToolError> {
        let until = until.unwrap_or(now);
        let earliest = (until - interval.max_bulk_window_secs()).max(0);

        let (since, clamped) = match since {
            None => (earliest, false),
            Some(since) if since < earliest => (earliest, true),
            Some(since) => (since, false),
        };

        if since > until {
            return Err(ToolError::validation(
                "since",
                format!("since ({}) is after until ({})", since, until),
            ));
        }
        Ok(Self {
            since,
            until,
            clamped,
        })
    }
}

// ============================================================================
// Structured Output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Ok,
    Error,
}

/// Why one asset of a bulk fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct AssetError {
    /// "network", "timeout", "upstream" or "decode"
    pub kind: String,
    pub message: String,
    /// Upstream HTTP status, when upstream answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&UpstreamError> for AssetError {
    fn from(err: &UpstreamError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            status: err.status_code(),
        }
    }
}

/// Observations (or the failure) for one asset.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AssetSeries {
    pub status: AssetStatus,
    pub count: usize,
    pub observations: Vec<Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AssetError>,
}

impl AssetSeries {
    fn from_result(result: Result<Vec<Observation>, UpstreamError>) -> Self {
        match result {
            Ok(observations) => Self {
                status: AssetStatus::Ok,
                count: observations.len(),
                observations,
                error: None,
            },
            Err(e) => Self::failed(AssetError::from(&e)),
        }
    }

    fn failed(error: AssetError) -> Self {
        Self {
            status: AssetStatus::Error,
            count: 0,
            observations: Vec::new(),
            error: Some(error),
        }
    }
}

/// Bulk fetch result.
///
/// Every requested asset has an entry in `data`. Assets whose upstream call
/// failed have `status: "error"` and are listed in `failed_assets`;
/// `partial` is true when some, but not all, assets failed.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct BulkMetricResult {
    pub path: String,
    pub interval: Interval,
    pub since: i64,
    pub until: i64,
    pub window_clamped: bool,
    pub requested: usize,
    pub succeeded: usize,
    /// Failed assets, in request order.
    pub failed_assets: Vec<String>,
    pub partial: bool,
    pub data: BTreeMap<String, AssetSeries>,
}

// ============================================================================
// Tool Implementation
// ============================================================================

pub struct FetchBulkMetricTool;

impl FetchBulkMetricTool {
    /// Fetch one metric for every requested asset.
    pub async fn fetch(
        client: &GlassnodeClient,
        params: FetchBulkMetricParams,
    ) -> Result<BulkMetricResult, ToolError> {
        let now = chrono::Utc::now().timestamp();
        Self::fetch_at(client, params, now).await
    }

    async fn fetch_at(
        client: &GlassnodeClient,
        params: FetchBulkMetricParams,
        now: i64,
    ) -> Result<BulkMetricResult, ToolError> {
        let window = BulkWindow::resolve(params.interval, params.since, params.until, now)?;
        if window.clamped {
            debug!(
                "Bulk window for {} clamped to {}..{}",
                params.path, window.since, window.until
            );
        }

        let base = MetricDataRequest {
            since: Some(window.since),
            until: Some(window.until),
            interval: Some(params.interval),
            currency: params.currency,
            extra: params.params,
            ..MetricDataRequest::new(params.path.as_str(), "")
        };

        let results: Vec<(String, Result<Vec<Observation>, UpstreamError>)> =
            stream::iter(params.assets.iter().cloned())
                .map(|asset| {
                    let request = base.for_asset(asset.as_str());
                    async move {
                        let result = client.metric_observations(&request).await;
                        (asset, result)
                    }
                })
                .buffer_unordered(client.bulk_concurrency())
                .collect()
                .await;

        let mut data = BTreeMap::new();
        for (asset, result) in results {
            if let Err(e) = &result {
                warn!("Bulk fetch of {} failed for {}: {}", params.path, asset, e);
            }
            data.insert(asset, AssetSeries::from_result(result));
        }

        let failed_assets: Vec<String> = params
            .assets
            .iter()
            .filter(|asset| {
                data.get(*asset)
                    .is_none_or(|series| series.status == AssetStatus::Error)
            })
            .cloned()
            .collect();
        let requested = params.assets.len();
        let succeeded = requested - failed_assets.len();

        Ok(BulkMetricResult {
            path: format!("/{}", params.path),
            interval: params.interval,
            since: window.since,
            until: window.until,
            window_clamped: window.clamped,
            requested,
            succeeded,
            partial: succeeded > 0 && !failed_assets.is_empty(),
            failed_assets,
            data,
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

impl GlassnodeTool for FetchBulkMetricTool {
    const NAME: &'static str = "fetch_bulk_metric";

    const DESCRIPTION: &'static str = "Fetch one Glassnode metric for several assets at once. \
        The time range is limited by interval (10m/1h: 10 days, 24h: 31 days, 1w/1month: \
        93 days); 'until' defaults to now and an older 'since' is moved forward. Results are \
        keyed by asset. Failing assets do not fail the request: each entry has a status \
        ('ok' or 'error'), failures are listed in 'failed_assets' and 'partial' is set when \
        only some assets failed.";

    type Params = FetchBulkMetricParams;
    type Output = BulkMetricResult;

    fn run(
        client: Arc<GlassnodeClient>,
        params: Self::Params,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
        async move { Self::fetch(&client, params).await }.boxed()
    }

    fn summarize(output: &Self::Output) -> String {
        if output.failed_assets.is_empty() {
            format!(
                "Fetched {} for {} asset(s)",
                output.path, output.succeeded
            )
        } else {
            format!(
                "Fetched {} for {}/{} asset(s); failed: {}",
                output.path,
                output.succeeded,
                output.requested,
                output.failed_assets.join(", ")
            )
        }
    }

    fn is_failure(output: &Self::Output) -> bool {
        output.succeeded == 0
    }
}
