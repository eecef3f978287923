//! Glassnode single-asset metric fetch tool.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{
    normalize_asset, normalize_metric_path, validate_extra_params, validate_time_range,
};
use crate::domains::glassnode::{
    Currency, DataFormat, GlassnodeClient, Interval, MetricData, MetricDataRequest, Observation,
};
use crate::domains::tools::ToolError;
use crate::domains::tools::handlers::{GlassnodeTool, Validate, create_route, tool_model};

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FetchMetricParams {
    /// Metric path, e.g. "/market/price_usd_close"
    pub path: String,

    /// Asset identifier, e.g. "BTC"
    pub asset: String,

    /// Start of the range, Unix timestamp in seconds
    #[serde(default)]
    pub since: Option<i64>,

    /// End of the range, Unix timestamp in seconds
    #[serde(default)]
    pub until: Option<i64>,

    /// Resolution: "10m", "1h", "24h", "1w" or "1month"
    #[serde(default)]
    pub interval: Option<Interval>,

    /// Response format: "json" (default) or "csv"
    #[serde(default)]
    pub format: DataFormat,

    /// Denomination for monetary metrics: "native" or "usd"
    #[serde(default)]
    pub currency: Option<Currency>,

    /// Additional upstream query parameters, passed through verbatim
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl Validate for FetchMetricParams {
    fn validate(self) -> Result<Self, ToolError> {
        let path = normalize_metric_path("path", &self.path)?;
        let asset = normalize_asset("asset", &self.asset)?;
        validate_time_range(self.since, self.until)?;
        validate_extra_params("params", &self.params)?;
        Ok(Self {
            path,
            asset,
            ..self
        })
    }
}

impl From<FetchMetricParams> for MetricDataRequest {
    fn from(params: FetchMetricParams) -> Self {
        Self {
            path: params.path,
            asset: params.asset,
            since: params.since,
            until: params.until,
            interval: params.interval,
            format: params.format,
            currency: params.currency,
            extra: params.params,
        }
    }
}

// ============================================================================
// Structured Output
// ============================================================================

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct MetricSeriesResult {
    pub path: String,
    pub asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
    pub format: DataFormat,
    /// Number of observations (0 for CSV output).
    pub count: usize,
    /// Observations sorted by timestamp, oldest first.
    pub observations: Vec<Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<i64>,
    /// Raw CSV body when `format` is "csv".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

impl MetricSeriesResult {
    fn new(request: &MetricDataRequest, data: MetricData) -> Self {
        let (observations, csv) = match data {
            MetricData::Observations(observations) => (observations, None),
            MetricData::Csv(body) => (Vec::new(), Some(body)),
        };
        Self {
            path: format!("/{}", request.path),
            asset: request.asset.clone(),
            interval: request.interval,
            format: request.format,
            count: observations.len(),
            first_timestamp: observations.first().map(|o| o.timestamp),
            last_timestamp: observations.last().map(|o| o.timestamp),
            observations,
            csv,
        }
    }
}

// ============================================================================
// Tool Implementation
// ============================================================================

pub struct FetchMetricTool;

impl FetchMetricTool {
    /// Fetch one metric for one asset.
    pub async fn fetch(
        client: &GlassnodeClient,
        params: FetchMetricParams,
    ) -> Result<MetricSeriesResult, ToolError> {
        let request = MetricDataRequest::from(params);
        let data = client.metric_data(&request).await?;
        Ok(MetricSeriesResult::new(&request, data))
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

impl GlassnodeTool for FetchMetricTool {
    const NAME: &'static str = "fetch_metric";

    const DESCRIPTION: &'static str = "Fetch time-series data for one Glassnode metric and one \
        asset. Optional 'since'/'until' bound the range (Unix seconds), 'interval' sets the \
        resolution, 'currency' the denomination and 'format' selects json (default) or csv. \
        Observations are returned oldest first.";

    type Params = FetchMetricParams;
    type Output = MetricSeriesResult;

    fn run(
        client: Arc<GlassnodeClient>,
        params: Self::Params,
    ) -> BoxFuture<'static, Result<Self::Output, ToolError>> {
        async move { Self::fetch(&client, params).await }.boxed()
    }

    fn summarize(output: &Self::Output) -> String {
        match output.format {
            DataFormat::Csv => format!("CSV data for {} ({})", output.path, output.asset),
            DataFormat::Json => format!(
                "Fetched {} observation(s) of {} for {}",
                output.count, output.path, output.asset
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::glassnode::mock::{MockHttpClient, test_client};
    use crate::domains::tools::handlers::{dispatch, parse_params};
    use serde_json::json;

    const PATH: &str = "market/price_usd_close";

    #[tokio::test]
    async fn test_observations_are_sorted() {
        let mock = Arc::new(MockHttpClient::new().with_json(
            PATH,
            json!([
                { "t": 300, "v": 3.0 },
                { "t": 100, "v": 1.0 },
                { "t": 200, "v": 2.0 }
            ]),
        ));
        let client = Arc::new(test_client(mock));

        let payload = dispatch::<FetchMetricTool>(
            client,
            json!({ "path": "/market/price_usd_close", "asset": "BTC" }),
        )
        .await
        .unwrap();

        let timestamps: Vec<i64> = payload["observations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["timestamp"].as_i64().unwrap())
            .collect();
        assert_eq!(timestamps, vec![100, 200, 300]);
        assert_eq!(payload["count"], 3);
        assert_eq!(payload["first_timestamp"], 100);
        assert_eq!(payload["last_timestamp"], 300);
        assert_eq!(payload["format"], "json");
        assert!(payload.get("csv").is_none());
    }

    #[tokio::test]
    async fn test_query_parameters_are_forwarded() {
        let mock = Arc::new(MockHttpClient::new().with_json(PATH, json!([])));
        let client = test_client(mock.clone());

        let params = parse_params::<FetchMetricTool>(json!({
            "path": "market/price_usd_close",
            "asset": "ETH",
            "since": 1600000000,
            "until": 1600086400,
            "interval": "1h",
            "currency": "usd",
            "params": { "timestamp_format": "unix" }
        }))
        .unwrap();
        let result = FetchMetricTool::fetch(&client, params).await.unwrap();
        assert_eq!(result.count, 0);
        assert_eq!(result.interval, Some(Interval::OneHour));

        let url = &mock.requests()[0].url;
        assert_eq!(
            url,
            "http://glassnode.test/v1/metrics/market/price_usd_close\
             ?a=ETH&s=1600000000&u=1600086400&i=1h&f=json&c=usd&timestamp_format=unix"
        );
    }

    #[tokio::test]
    async fn test_csv_format() {
        let csv = "timestamp,value\n2020-09-13T00:00:00Z,10331.2\n";
        let mock = Arc::new(MockHttpClient::new().with_response(PATH, None, 200, csv));
        let client = Arc::new(test_client(mock));

        let payload = dispatch::<FetchMetricTool>(
            client,
            json!({ "path": PATH, "asset": "BTC", "format": "csv" }),
        )
        .await
        .unwrap();
        assert_eq!(payload["csv"], csv);
        assert_eq!(payload["count"], 0);
        assert_eq!(payload["observations"], json!([]));
    }

    #[tokio::test]
    async fn test_invalid_arguments_make_no_call() {
        let mock = Arc::new(MockHttpClient::new().with_json(PATH, json!([])));
        let client = Arc::new(test_client(mock.clone()));

        let cases = [
            (json!({ "path": PATH }), "asset"),
            (json!({ "asset": "BTC" }), "path"),
            (json!({ "path": PATH, "asset": "BTC", "since": 20, "until": 10 }), "since"),
            (json!({ "path": PATH, "asset": "BTC", "params": { "a": "ETH" } }), "params"),
            (json!({ "path": "../admin", "asset": "BTC" }), "path"),
        ];
        for (args, expected) in cases {
            match dispatch::<FetchMetricTool>(client.clone(), args).await {
                Err(ToolError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("Expected validation error on {}, got {:?}", expected, other),
            }
        }

        let err = dispatch::<FetchMetricTool>(
            client,
            json!({ "path": PATH, "asset": "BTC", "interval": "5m" }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));

        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_status_is_reported() {
        let mock = Arc::new(MockHttpClient::new().with_response(PATH, None, 403, "tier too low"));
        let client = test_client(mock);

        let params = parse_params::<FetchMetricTool>(json!({ "path": PATH, "asset": "BTC" })).unwrap();
        let err = FetchMetricTool::fetch(&client, params).await.unwrap_err();
        let json = err.to_json();
        assert_eq!(json["kind"], "upstream");
        assert_eq!(json["status"], 403);
    }

    #[tokio::test]
    async fn test_humanized_timestamps_are_decoded() {
        let mock = Arc::new(MockHttpClient::new().with_json(
            PATH,
            json!([
                { "t": "2024-01-02T00:00:00Z", "v": 2.0 },
                { "t": "2024-01-01T00:00:00Z", "v": 1.0 }
            ]),
        ));
        let client = Arc::new(test_client(mock.clone()));

        let payload = dispatch::<FetchMetricTool>(
            client,
            json!({
                "path": PATH,
                "asset": "BTC",
                "params": { "timestamp_format": "humanized" }
            }),
        )
        .await
        .unwrap();

        assert_eq!(mock.call_count(), 1);
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["first_timestamp"], 1704067200);
        assert_eq!(payload["last_timestamp"], 1704153600);
    }
}
