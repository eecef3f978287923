//! Glassnode domain module.
//!
//! HTTP client adapter for the Glassnode REST API. Tools never build URLs
//! or parse upstream JSON themselves; they go through [`GlassnodeClient`].
//!
//! ## Architecture
//!
//! - `client.rs` - `GlassnodeClient`: endpoints, auth, retry-on-429, decoding
//! - `http.rs` - `HttpClient` transport trait and its reqwest implementation
//! - `query.rs` - query-string building
//! - `models.rs` - typed upstream models and request types
//! - `error.rs` - `UpstreamError`

mod client;
mod error;
mod http;
pub mod models;
mod query;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{API_KEY_HEADER, GlassnodeClient};
pub use error::UpstreamError;
pub use http::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use models::{
    Asset, Currency, DataFormat, Interval, MetricData, MetricDataRequest, MetricMetadata,
    Observation,
};
pub use query::{QueryParams, QueryValue};
