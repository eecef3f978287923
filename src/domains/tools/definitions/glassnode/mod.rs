//! Glassnode tools module.
//!
//! Read-only tools proxying the Glassnode REST API:
//! - `assets`: List supported assets
//! - `metrics`: List available metric paths
//! - `metadata`: Describe one metric
//! - `fetch`: Time series of one metric for one asset
//! - `bulk`: One metric across several assets, with per-asset status
//!
//! Each tool has handlers for both HTTP and STDIO/TCP transports.

pub mod assets;
pub mod bulk;
pub mod common;
pub mod fetch;
pub mod metadata;
pub mod metrics;

pub use assets::{AssetsListResult, GetAssetsListParams, GetAssetsListTool};
pub use bulk::{
    AssetError, AssetSeries, AssetStatus, BulkMetricResult, BulkWindow, FetchBulkMetricParams,
    FetchBulkMetricTool,
};
pub use fetch::{FetchMetricParams, FetchMetricTool, MetricSeriesResult};
pub use metadata::{GetMetricMetadataParams, GetMetricMetadataTool, MetricMetadataResult};
pub use metrics::{GetMetricsListParams, GetMetricsListTool, MetricsListResult};
