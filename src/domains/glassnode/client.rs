//! Glassnode REST API client.
//!
//! Issues authenticated GET requests, serializes query parameters, decodes
//! JSON into typed models and maps every failure to [`UpstreamError`].
//! Responses with HTTP 429 are retried with exponential backoff; nothing
//! else is retried and nothing is cached.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::error::UpstreamError;
use super::http::{HttpClient, HttpRequest, ReqwestHttpClient};
use super::models::{
    Asset, DataFormat, MetricData, MetricDataRequest, MetricMetadata, Observation,
    RawObservation, into_ordered_observations,
};
use super::query::QueryParams;
use crate::core::config::GlassnodeConfig;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Upper bound for a single retry delay.
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Client for the Glassnode API.
///
/// Cheap to share behind an `Arc`; it holds no mutable state.
#[derive(Clone)]
pub struct GlassnodeClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
    bulk_concurrency: usize,
}

impl std::fmt::Debug for GlassnodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlassnodeClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("bulk_concurrency", &self.bulk_concurrency)
            .finish()
    }
}

impl GlassnodeClient {
    /// Create a client backed by reqwest.
    pub fn new(config: &GlassnodeConfig) -> Result<Self, UpstreamError> {
        let http = ReqwestHttpClient::new(config.timeout())?;
        Ok(Self::with_http_client(config, Arc::new(http)))
    }

    /// Create a client using a custom transport.
    pub fn with_http_client(config: &GlassnodeConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
            bulk_concurrency: config.effective_bulk_concurrency(),
        }
    }

    /// Maximum number of concurrent upstream calls for one bulk fetch.
    pub fn bulk_concurrency(&self) -> usize {
        self.bulk_concurrency
    }

    /// Build the absolute URL for an endpoint.
    fn url_for(&self, endpoint: &str, params: &QueryParams) -> Result<String, UpstreamError> {
        let endpoint = endpoint.trim_start_matches('/');
        let mut url = format!("{}/{}", self.base_url, endpoint);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.to_query_string()?);
        }
        Ok(url)
    }

    /// Delay before retry number `attempt` (0-based).
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_backoff
            .saturating_mul(factor)
            .min(MAX_RETRY_BACKOFF)
    }

    /// Perform a GET and return the raw body of a successful response.
    #[instrument(skip(self, params), fields(endpoint = %endpoint))]
    pub async fn send_text(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<String, UpstreamError> {
        let url = self.url_for(endpoint, params)?;
        debug!("GET {}", url);

        let mut attempt = 0;
        loop {
            let mut request = HttpRequest::get(&url, self.timeout);
            if let Some(key) = &self.api_key {
                request = request.with_header(API_KEY_HEADER, key);
            }

            let response = match self.http.get(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Upstream request to {} failed: {}", endpoint, e);
                    return Err(e);
                }
            };

            if response.is_success() {
                return Ok(response.body);
            }

            let err = UpstreamError::status(response.status, &response.body);
            if err.is_rate_limited() && attempt < self.max_retries {
                let delay = self.backoff(attempt);
                warn!(
                    "Rate limited by upstream on {}, retrying in {:?} (attempt {}/{})",
                    endpoint,
                    delay,
                    attempt + 1,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            warn!("Upstream returned HTTP {} for {}", response.status, endpoint);
            return Err(err);
        }
    }

    /// Perform a GET and parse the body as JSON.
    pub async fn send(&self, endpoint: &str, params: &QueryParams) -> Result<Value, UpstreamError> {
        self.get_json(endpoint, params).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<T, UpstreamError> {
        let body = self.send_text(endpoint, params).await?;
        serde_json::from_str(&body).map_err(|e| {
            UpstreamError::decode(format!("unexpected response from {}: {}", endpoint, e))
        })
    }

    /// List all supported assets.
    pub async fn assets(&self) -> Result<Vec<Asset>, UpstreamError> {
        info!("Fetching assets list");
        self.get_json("metadata/assets", &QueryParams::new()).await
    }

    /// List all available metric paths.
    pub async fn metrics(&self) -> Result<Vec<String>, UpstreamError> {
        info!("Fetching metrics list");
        self.get_json("metadata/metrics", &QueryParams::new()).await
    }

    /// Fetch metadata for a metric, optionally specialised for one asset.
    ///
    /// Returns `Ok(None)` when upstream answers successfully but with no
    /// content (`null`, `{}` or an empty body).
    pub async fn metric_metadata(
        &self,
        path: &str,
        asset: Option<&str>,
    ) -> Result<Option<MetricMetadata>, UpstreamError> {
        info!("Fetching metadata for metric: {}", path);

        let mut params = QueryParams::new().with("path", format!("/{}", path.trim_matches('/')));
        params.set_opt("a", asset);

        let endpoint = "metadata/metric";
        let body = self.send_text(endpoint, &params).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let metadata: Option<MetricMetadata> = serde_json::from_str(&body).map_err(|e| {
            UpstreamError::decode(format!("unexpected response from {}: {}", endpoint, e))
        })?;
        Ok(metadata.filter(|m| !m.is_empty()))
    }

    /// Fetch one metric's time series for one asset.
    pub async fn metric_data(
        &self,
        request: &MetricDataRequest,
    ) -> Result<MetricData, UpstreamError> {
        info!(
            "Fetching metric {} for asset {}",
            request.path, request.asset
        );

        let endpoint = Self::data_endpoint(request);
        let params = Self::data_params(request);

        match request.format {
            DataFormat::Json => Ok(MetricData::Observations(
                self.get_observations(&endpoint, &params).await?,
            )),
            DataFormat::Csv => Ok(MetricData::Csv(self.send_text(&endpoint, &params).await?)),
        }
    }

    /// Fetch one metric's time series as ordered observations, always in
    /// JSON whatever `request.format` says.
    pub async fn metric_observations(
        &self,
        request: &MetricDataRequest,
    ) -> Result<Vec<Observation>, UpstreamError> {
        info!(
            "Fetching observations of {} for asset {}",
            request.path, request.asset
        );

        let mut params = Self::data_params(request);
        params.set("f", DataFormat::Json.as_str());
        self.get_observations(&Self::data_endpoint(request), &params)
            .await
    }

    async fn get_observations(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<Vec<Observation>, UpstreamError> {
        let raw: Vec<RawObservation> = self.get_json(endpoint, params).await?;
        Ok(into_ordered_observations(raw))
    }

    fn data_endpoint(request: &MetricDataRequest) -> String {
        format!("metrics/{}", request.path.trim_matches('/'))
    }

    fn data_params(request: &MetricDataRequest) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .set("a", request.asset.as_str())
            .set_opt("s", request.since)
            .set_opt("u", request.until)
            .set_opt("i", request.interval.map(|i| i.as_str()))
            .set("f", request.format.as_str())
            .set_opt("c", request.currency.map(|c| c.as_str()));
        for (key, value) in &request.extra {
            params.set(key.as_str(), value.as_str());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::glassnode::mock::{MockHttpClient, test_client, test_config};
    use crate::domains::glassnode::models::{Currency, Interval};
    use serde_json::json;

    #[tokio::test]
    async fn test_send_attaches_api_key_and_query() {
        let mock = Arc::new(MockHttpClient::new().with_json("metadata/metric", json!({"path": "/x"})));
        let client = test_client(mock.clone());

        let params = QueryParams::new().with("path", "/market/price_usd_close");
        let value = client.send("/metadata/metric", &params).await.unwrap();
        assert_eq!(value, json!({"path": "/x"}));

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "http://glassnode.test/v1/metadata/metric?path=%2Fmarket%2Fprice_usd_close"
        );
        assert_eq!(requests[0].header("x-api-key"), Some("test-key"));
        assert_eq!(requests[0].timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_status_error() {
        let mock = Arc::new(MockHttpClient::new().with_response(
            "metadata/assets",
            None,
            401,
            "Unauthorized",
        ));
        let client = test_client(mock);

        match client.assets().await {
            Err(UpstreamError::Status { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_maps_to_decode_error() {
        let mock = Arc::new(MockHttpClient::new().with_response(
            "metadata/assets",
            None,
            200,
            "<html>oops</html>",
        ));
        let client = test_client(mock);

        let err = client.assets().await.unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn test_wrong_shape_maps_to_decode_error() {
        let mock = Arc::new(
            MockHttpClient::new().with_json("metadata/metrics", json!({"unexpected": "object"})),
        );
        let client = test_client(mock);

        assert!(matches!(
            client.metrics().await,
            Err(UpstreamError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let mock = Arc::new(
            MockHttpClient::new()
                .with_response("metadata/metrics", None, 429, "Too Many Requests")
                .with_response("metadata/metrics", None, 200, r#"["/market/price_usd_close"]"#),
        );
        let client = test_client(mock.clone());

        let metrics = client.metrics().await.unwrap();
        assert_eq!(metrics, vec!["/market/price_usd_close".to_string()]);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_are_bounded() {
        let mock = Arc::new(MockHttpClient::new().with_response(
            "metadata/metrics",
            None,
            429,
            "Too Many Requests",
        ));
        let client = test_client(mock.clone());

        let err = client.metrics().await.unwrap_err();
        assert_eq!(err.status_code(), Some(429));
        // One initial attempt plus `max_retries` retries.
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mock = Arc::new(MockHttpClient::new().with_response(
            "metadata/metrics",
            None,
            500,
            "Internal Server Error",
        ));
        let client = test_client(mock.clone());

        assert!(client.metrics().await.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_metric_metadata_null_is_none() {
        let mock = Arc::new(MockHttpClient::new().with_response(
            "metadata/metric",
            None,
            200,
            "null",
        ));
        let client = test_client(mock);

        let metadata = client
            .metric_metadata("market/does_not_exist", None)
            .await
            .unwrap();
        assert!(metadata.is_none());
    }

    #[tokio::test]
    async fn test_metric_metadata_passes_asset() {
        let mock = Arc::new(MockHttpClient::new().with_json(
            "metadata/metric",
            json!({"path": "/market/price_usd_close", "tier": 1}),
        ));
        let client = test_client(mock.clone());

        let metadata = client
            .metric_metadata("/market/price_usd_close/", Some("ETH"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metadata.tier, Some(1));
        assert_eq!(
            mock.requests()[0].url,
            "http://glassnode.test/v1/metadata/metric?path=%2Fmarket%2Fprice_usd_close&a=ETH"
        );
    }

    #[tokio::test]
    async fn test_metric_data_query_and_ordering() {
        let mock = Arc::new(MockHttpClient::new().with_json(
            "metrics/market/price_usd_close",
            json!([{"t": 300, "v": 3.0}, {"t": 100, "v": 1.0}, {"t": 200, "v": 2.0}]),
        ));
        let client = test_client(mock.clone());

        let mut request = MetricDataRequest::new("market/price_usd_close", "BTC");
        request.since = Some(100);
        request.until = Some(300);
        request.interval = Some(Interval::OneHour);
        request.currency = Some(Currency::Usd);
        request
            .extra
            .insert("timestamp_format".to_string(), "unix".to_string());

        let data = client.metric_data(&request).await.unwrap();
        let observations = match data {
            MetricData::Observations(o) => o,
            MetricData::Csv(_) => panic!("Expected JSON observations"),
        };
        let timestamps: Vec<i64> = observations.iter().map(|o| o.timestamp).collect();
        assert_eq!(timestamps, vec![100, 200, 300]);

        assert_eq!(
            mock.requests()[0].url,
            "http://glassnode.test/v1/metrics/market/price_usd_close?a=BTC&s=100&u=300&i=1h&f=json&c=usd&timestamp_format=unix"
        );
    }

    #[tokio::test]
    async fn test_metric_data_csv_is_returned_raw() {
        let mock = Arc::new(MockHttpClient::new().with_response(
            "metrics/market/price_usd_close",
            Some("BTC"),
            200,
            "timestamp,value\n2024-01-01T00:00:00Z,42000\n",
        ));
        let client = test_client(mock);

        let mut request = MetricDataRequest::new("market/price_usd_close", "BTC");
        request.format = DataFormat::Csv;

        match client.metric_data(&request).await.unwrap() {
            MetricData::Csv(csv) => assert!(csv.starts_with("timestamp,value")),
            MetricData::Observations(_) => panic!("Expected CSV"),
        }
    }

    #[tokio::test]
    async fn test_metric_observations_forces_json() {
        let mock = Arc::new(MockHttpClient::new().with_json(
            "metrics/market/price_usd_close",
            json!([{"t": 2, "v": 2.0}, {"t": 1, "v": 1.0}]),
        ));
        let client = test_client(mock.clone());

        let mut request = MetricDataRequest::new("market/price_usd_close", "ETH");
        request.format = DataFormat::Csv;

        let observations = client.metric_observations(&request).await.unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].timestamp, 1);
        assert_eq!(
            mock.requests()[0].url,
            "http://glassnode.test/v1/metrics/market/price_usd_close?a=ETH&f=json"
        );
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut config = test_config();
        config.retry_backoff_ms = 1000;
        let client = GlassnodeClient::with_http_client(&config, Arc::new(MockHttpClient::new()));
        assert_eq!(client.backoff(0), Duration::from_secs(1));
        assert_eq!(client.backoff(1), Duration::from_secs(2));
        assert_eq!(client.backoff(2), Duration::from_secs(4));
        assert_eq!(client.backoff(3), MAX_RETRY_BACKOFF);
        assert_eq!(client.backoff(40), MAX_RETRY_BACKOFF);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = test_client(Arc::new(MockHttpClient::new()));
        let debug = format!("{:?}", client);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("test-key"));
    }
}
