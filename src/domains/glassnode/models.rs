//! Typed models for Glassnode API responses.
//!
//! Only the fields the tools rely on are typed; everything else upstream
//! sends is kept verbatim in a flattened `extra` map.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

/// An asset supported by Glassnode (`metadata/assets`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Asset {
    /// Asset identifier used in the `a` query parameter (e.g. `BTC`).
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    /// Remaining upstream fields, passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Metadata for one metric (`metadata/metric`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_supported: Option<bool>,
    /// Supported parameter values, keyed by parameter name (`a`, `i`, `c`...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MetricMetadata {
    /// True when upstream returned an object with nothing in it.
    pub fn is_empty(&self) -> bool {
        self.path.is_none()
            && self.tier.is_none()
            && self.bulk_supported.is_none()
            && self.parameters.is_empty()
            && self.extra.is_empty()
    }
}

/// A single time-series point as sent by upstream.
///
/// Scalar metrics use `v`, multi-value metrics use `o`. `t` is Unix seconds,
/// or an RFC 3339 string when `timestamp_format=humanized` is passed through.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
    #[serde(deserialize_with = "unix_or_rfc3339")]
    pub t: i64,
    #[serde(default)]
    pub v: Option<Value>,
    #[serde(default)]
    pub o: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Unix(i64),
    Text(String),
}

fn unix_or_rfc3339<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match WireTimestamp::deserialize(deserializer)? {
        WireTimestamp::Unix(secs) => Ok(secs),
        WireTimestamp::Text(text) => chrono::DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.timestamp())
            .map_err(|e| de::Error::custom(format!("invalid timestamp {text:?}: {e}"))),
    }
}

/// A time-series observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    /// Unix timestamp (seconds).
    pub timestamp: i64,
    /// Metric value: a number for scalar metrics, an object for multi-value metrics.
    pub value: Value,
}

impl From<RawObservation> for Observation {
    fn from(raw: RawObservation) -> Self {
        Self {
            timestamp: raw.t,
            value: raw.v.or(raw.o).unwrap_or(Value::Null),
        }
    }
}

/// Convert upstream points into observations ordered by timestamp.
///
/// The sort is stable, so points sharing a timestamp keep upstream order.
pub fn into_ordered_observations(raw: Vec<RawObservation>) -> Vec<Observation> {
    let mut observations: Vec<Observation> = raw.into_iter().map(Observation::from).collect();
    observations.sort_by_key(|o| o.timestamp);
    observations
}

/// Resolution intervals supported by Glassnode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Interval {
    #[serde(rename = "10m")]
    TenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1month")]
    OneMonth,
}

const DAY_SECS: i64 = 24 * 60 * 60;

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenMinutes => "10m",
            Self::OneHour => "1h",
            Self::OneDay => "24h",
            Self::OneWeek => "1w",
            Self::OneMonth => "1month",
        }
    }

    /// Longest time range (seconds) a bulk fetch may span at this resolution.
    pub fn max_bulk_window_secs(&self) -> i64 {
        match self {
            Self::TenMinutes | Self::OneHour => 10 * DAY_SECS,
            Self::OneDay => 31 * DAY_SECS,
            Self::OneWeek | Self::OneMonth => 93 * DAY_SECS,
        }
    }
}

/// Response format requested from upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Json,
    Csv,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Denomination of monetary metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Native,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Usd => "usd",
        }
    }
}

/// Query keys the client sets itself; callers may not override them.
pub const RESERVED_QUERY_KEYS: &[&str] = &["a", "s", "u", "i", "f", "c", "path", "api_key"];

/// A validated request for one metric's time series for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDataRequest {
    /// Metric path without leading or trailing slashes (e.g. `market/price_usd_close`).
    pub path: String,
    pub asset: String,
    pub since: Option<i64>,
    pub until: Option<i64>,
    pub interval: Option<Interval>,
    pub format: DataFormat,
    pub currency: Option<Currency>,
    /// Extra upstream parameters passed through verbatim.
    pub extra: BTreeMap<String, String>,
}

impl MetricDataRequest {
    pub fn new(path: impl Into<String>, asset: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            asset: asset.into(),
            since: None,
            until: None,
            interval: None,
            format: DataFormat::Json,
            currency: None,
            extra: BTreeMap::new(),
        }
    }

    /// Same request for a different asset.
    pub fn for_asset(&self, asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            ..self.clone()
        }
    }
}

/// Decoded body of a metric data call.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricData {
    Observations(Vec<Observation>),
    Csv(String),
}
