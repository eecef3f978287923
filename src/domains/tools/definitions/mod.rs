//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod glassnode;

pub use glassnode::{
    FetchBulkMetricParams, FetchBulkMetricTool, FetchMetricParams, FetchMetricTool,
    GetAssetsListTool, GetMetricMetadataParams, GetMetricMetadataTool, GetMetricsListTool,
};
