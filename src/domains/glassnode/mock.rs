//! In-memory `HttpClient` used by unit tests.
//!
//! Routes are matched on the endpoint path (suffix of the URL path) and,
//! optionally, on the `a` (asset) query parameter. A route holding several
//! responses serves them in order and then keeps repeating the last one.
//! Every request is recorded.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::client::GlassnodeClient;
use super::error::UpstreamError;
use super::http::{HttpClient, HttpRequest, HttpResponse};
use crate::core::config::GlassnodeConfig;

struct MockRoute {
    path: String,
    asset: Option<String>,
    responses: VecDeque<HttpResponse>,
}

impl MockRoute {
    fn matches(&self, path: &str, asset: Option<&str>) -> bool {
        let suffix = format!("/{}", self.path.trim_start_matches('/'));
        path.ends_with(&suffix)
            && match &self.asset {
                Some(expected) => asset == Some(expected.as_str()),
                None => true,
            }
    }
}

#[derive(Default)]
pub struct MockHttpClient {
    routes: Mutex<Vec<MockRoute>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a 200 JSON response for any asset.
    pub fn with_json(self, path: &str, body: serde_json::Value) -> Self {
        self.with_response(path, None, 200, body.to_string())
    }

    /// Register a response. Calling this again for the same path/asset
    /// appends to that route's response sequence.
    pub fn with_response(
        self,
        path: &str,
        asset: Option<&str>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        let response = HttpResponse::new(status, body);
        {
            let mut routes = self.routes.lock().unwrap();
            let existing = routes
                .iter_mut()
                .find(|r| r.path == path && r.asset.as_deref() == asset);
            match existing {
                Some(route) => route.responses.push_back(response),
                None => routes.push(MockRoute {
                    path: path.to_string(),
                    asset: asset.map(str::to_string),
                    responses: VecDeque::from([response]),
                }),
            }
        }
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());

        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| UpstreamError::network(format!("invalid URL: {}", e)))?;
        let asset = url
            .query_pairs()
            .find(|(k, _)| k == "a")
            .map(|(_, v)| v.into_owned());

        let mut routes = self.routes.lock().unwrap();
        // Asset-specific routes win over catch-all ones.
        let index = routes
            .iter()
            .position(|r| r.asset.is_some() && r.matches(url.path(), asset.as_deref()))
            .or_else(|| {
                routes
                    .iter()
                    .position(|r| r.matches(url.path(), asset.as_deref()))
            });

        match index {
            Some(i) => {
                let route = &mut routes[i];
                let response = if route.responses.len() > 1 {
                    route.responses.pop_front()
                } else {
                    route.responses.front().cloned()
                };
                Ok(response.unwrap_or_else(|| HttpResponse::new(500, "empty mock route")))
            }
            None => Ok(HttpResponse::new(404, "no mock route")),
        }
    }
}

/// Glassnode configuration pointing at a fake host, with near-zero backoff.
pub fn test_config() -> GlassnodeConfig {
    GlassnodeConfig {
        api_key: Some("test-key".to_string()),
        base_url: "http://glassnode.test/v1".to_string(),
        retry_backoff_ms: 1,
        ..GlassnodeConfig::default()
    }
}

/// A client wired to the given mock.
pub fn test_client(mock: Arc<MockHttpClient>) -> GlassnodeClient {
    GlassnodeClient::with_http_client(&test_config(), mock)
}
