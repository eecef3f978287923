//! Common utilities shared across Glassnode tools.
//!
//! Argument normalization and validation helpers. All of them run before
//! any upstream call is made.

use std::collections::BTreeMap;

use crate::domains::glassnode::models::RESERVED_QUERY_KEYS;
use crate::domains::tools::ToolError;

/// Longest accepted asset identifier.
const MAX_ASSET_LEN: usize = 32;

/// Maximum number of assets in one bulk fetch.
pub const MAX_BULK_ASSETS: usize = 50;

/// Normalize a metric path: trims whitespace and surrounding slashes.
///
/// `/market/price_usd_close/` becomes `market/price_usd_close`.
pub fn normalize_metric_path(field: &str, raw: &str) -> Result<String, ToolError> {
    let path = raw.trim().trim_matches('/');
    if path.is_empty() {
        return Err(ToolError::validation(field, "metric path must not be empty"));
    }
    if path.contains("//") || path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(ToolError::validation(
            field,
            format!("malformed metric path: {}", raw),
        ));
    }
    if !path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '.'))
    {
        return Err(ToolError::validation(
            field,
            format!("metric path contains invalid characters: {}", raw),
        ));
    }
    Ok(path.to_string())
}

/// Normalize an asset identifier (e.g. `BTC`).
pub fn normalize_asset(field: &str, raw: &str) -> Result<String, ToolError> {
    let asset = raw.trim();
    if asset.is_empty() {
        return Err(ToolError::validation(field, "asset must not be empty"));
    }
    if asset.len() > MAX_ASSET_LEN {
        return Err(ToolError::validation(
            field,
            format!("asset identifier longer than {} characters", MAX_ASSET_LEN),
        ));
    }
    if !asset
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ToolError::validation(
            field,
            format!("asset contains invalid characters: {}", raw),
        ));
    }
    Ok(asset.to_string())
}

/// Normalize a list of assets: each entry validated, duplicates dropped
/// (first occurrence wins), order preserved.
pub fn normalize_asset_list(field: &str, raw: &[String]) -> Result<Vec<String>, ToolError> {
    if raw.is_empty() {
        return Err(ToolError::validation(field, "at least one asset is required"));
    }

    let mut assets: Vec<String> = Vec::with_capacity(raw.len());
    for entry in raw {
        let asset = normalize_asset(field, entry)?;
        if !assets.contains(&asset) {
            assets.push(asset);
        }
    }

    if assets.len() > MAX_BULK_ASSETS {
        return Err(ToolError::validation(
            field,
            format!("at most {} assets per request", MAX_BULK_ASSETS),
        ));
    }
    Ok(assets)
}

/// Check `since`/`until` Unix timestamps.
pub fn validate_time_range(since: Option<i64>, until: Option<i64>) -> Result<(), ToolError> {
    if let Some(since) = since {
        if since < 0 {
            return Err(ToolError::validation("since", "timestamp must not be negative"));
        }
    }
    if let Some(until) = until {
        if until < 0 {
            return Err(ToolError::validation("until", "timestamp must not be negative"));
        }
    }
    if let (Some(since), Some(until)) = (since, until) {
        if since > until {
            return Err(ToolError::validation(
                "since",
                format!("since ({}) is after until ({})", since, until),
            ));
        }
    }
    Ok(())
}

/// Check pass-through upstream parameters.
pub fn validate_extra_params(
    field: &str,
    params: &BTreeMap<String, String>,
) -> Result<(), ToolError> {
    for key in params.keys() {
        if key.trim().is_empty() {
            return Err(ToolError::validation(field, "parameter names must not be empty"));
        }
        if RESERVED_QUERY_KEYS.contains(&key.as_str()) {
            return Err(ToolError::validation(
                field,
                format!("'{}' is set by the tool and cannot be overridden", key),
            ));
        }
    }
    Ok(())
}
