//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (and a `.env` file) or defaults.
//! It is built once in `main` and injected everywhere else.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use std::time::Duration;
use tracing::{info, warn};

/// Default Glassnode API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.glassnode.com/v1";

/// Upper bound for the bulk fan-out pool.
pub const MAX_BULK_CONCURRENCY: usize = 16;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Upstream Glassnode API configuration.
    pub glassnode: GlassnodeConfig,

    /// Problems found while reading the environment. Reported by
    /// [`Config::log_summary`] once logging is up.
    pub env_warnings: Vec<String>,
}

/// Server identification configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for the upstream Glassnode API client.
#[derive(Clone)]
pub struct GlassnodeConfig {
    /// API key sent with every request.
    /// Get one at: https://studio.glassnode.com/settings/api
    pub api_key: Option<String>,

    /// Base URL of the REST API, without trailing slash.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// How many times a request answered with HTTP 429 is retried.
    pub max_retries: u32,

    /// Initial backoff before retrying a rate-limited request, in milliseconds.
    /// Doubles on every attempt.
    pub retry_backoff_ms: u64,

    /// Maximum number of concurrent upstream calls for one bulk fetch.
    pub bulk_concurrency: usize,
}

/// Custom Debug implementation to redact the API key from logs.
impl std::fmt::Debug for GlassnodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlassnodeConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("bulk_concurrency", &self.bulk_concurrency)
            .finish()
    }
}

impl GlassnodeConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Initial retry backoff.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Bulk concurrency clamped to `1..=MAX_BULK_CONCURRENCY`.
    pub fn effective_bulk_concurrency(&self) -> usize {
        self.bulk_concurrency.clamp(1, MAX_BULK_CONCURRENCY)
    }
}

impl Default for GlassnodeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            bulk_concurrency: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "glassnode-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            glassnode: GlassnodeConfig::default(),
            env_warnings: Vec::new(),
        }
    }
}

/// Parse a numeric environment variable, falling back to `default` on bad
/// input and noting it in `warnings`.
fn env_parse<T: std::str::FromStr>(name: &str, default: T, warnings: &mut Vec<String>) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warnings.push(format!("Ignoring invalid value for {}: {:?}", name, raw));
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// The API key is read from `GLASSNODE_API_KEY`; everything else uses
    /// the `MCP_` prefix, e.g. `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    ///
    /// Runs before logging is initialized, so nothing is logged here: bad
    /// values are collected in `env_warnings`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        config.glassnode.api_key = std::env::var("GLASSNODE_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        if let Ok(base_url) = std::env::var("MCP_GLASSNODE_BASE_URL") {
            config.glassnode.base_url = base_url.trim_end_matches('/').to_string();
        }

        let defaults = GlassnodeConfig::default();
        let warnings = &mut config.env_warnings;
        config.glassnode.timeout_secs =
            env_parse("MCP_GLASSNODE_TIMEOUT_SECS", defaults.timeout_secs, warnings);
        config.glassnode.max_retries =
            env_parse("MCP_GLASSNODE_MAX_RETRIES", defaults.max_retries, warnings);
        config.glassnode.bulk_concurrency =
            env_parse("MCP_BULK_CONCURRENCY", defaults.bulk_concurrency, warnings);

        config
    }

    /// Log what was loaded and any environment problems. Call once the
    /// tracing subscriber is installed.
    pub fn log_summary(&self) {
        for warning in &self.env_warnings {
            warn!("{}", warning);
        }

        if self.glassnode.api_key.is_some() {
            info!("Glassnode API key loaded from environment");
        } else {
            warn!("GLASSNODE_API_KEY is not set");
        }

        info!("Using Glassnode base URL: {}", self.glassnode.base_url);
    }

    /// Check that the configuration is usable before starting the server.
    pub fn validate(&self) -> Result<()> {
        if self.glassnode.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::config(
                "GLASSNODE_API_KEY environment variable not set. Please set it before running the server.",
            ));
        }
        if self.glassnode.timeout_secs == 0 {
            return Err(Error::config("MCP_GLASSNODE_TIMEOUT_SECS must be greater than zero"));
        }
        if !self.glassnode.base_url.starts_with("http://")
            && !self.glassnode.base_url.starts_with("https://")
        {
            return Err(Error::config(format!(
                "Invalid Glassnode base URL: {}",
                self.glassnode.base_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        unsafe {
            std::env::remove_var("GLASSNODE_API_KEY");
            std::env::remove_var("MCP_GLASSNODE_BASE_URL");
            std::env::remove_var("MCP_GLASSNODE_TIMEOUT_SECS");
            std::env::remove_var("MCP_GLASSNODE_MAX_RETRIES");
            std::env::remove_var("MCP_BULK_CONCURRENCY");
            std::env::remove_var("MCP_TRANSPORT");
            std::env::remove_var("MCP_HTTP_PORT");
            std::env::remove_var("MCP_HTTP_PATH");
            std::env::remove_var("MCP_HTTP_CORS");
        }
    }

    #[test]
    fn test_api_key_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("GLASSNODE_API_KEY", "test_key_12345");
        }
        let config = Config::from_env();
        assert_eq!(config.glassnode.api_key.as_deref(), Some("test_key_12345"));
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        let mut config = Config::from_env();
        // A developer .env file may still provide the key.
        config.glassnode.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GLASSNODE_API_KEY"));
    }

    #[test]
    fn test_glassnode_overrides_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("MCP_GLASSNODE_BASE_URL", "http://localhost:9999/v1/");
            std::env::set_var("MCP_GLASSNODE_TIMEOUT_SECS", "5");
            std::env::set_var("MCP_GLASSNODE_MAX_RETRIES", "not-a-number");
            std::env::set_var("MCP_BULK_CONCURRENCY", "8");
        }
        let config = Config::from_env();
        assert_eq!(config.glassnode.base_url, "http://localhost:9999/v1");
        assert_eq!(config.glassnode.timeout(), Duration::from_secs(5));
        assert_eq!(config.glassnode.max_retries, 2);
        assert_eq!(config.glassnode.bulk_concurrency, 8);
        assert_eq!(config.env_warnings.len(), 1);
        assert!(config.env_warnings[0].contains("MCP_GLASSNODE_MAX_RETRIES"));
        clear_env();
    }

    #[test]
    fn test_clean_env_has_no_warnings() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        let config = Config::from_env();
        assert!(config.env_warnings.is_empty());
        config.log_summary();
    }

    #[test]
    fn test_invalid_base_url_fails_validation() {
        let mut config = Config::default();
        config.glassnode.api_key = Some("key".to_string());
        config.glassnode.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bulk_concurrency_is_clamped() {
        let mut glassnode = GlassnodeConfig::default();
        glassnode.bulk_concurrency = 0;
        assert_eq!(glassnode.effective_bulk_concurrency(), 1);
        glassnode.bulk_concurrency = 1000;
        assert_eq!(glassnode.effective_bulk_concurrency(), MAX_BULK_CONCURRENCY);
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let glassnode = GlassnodeConfig {
            api_key: Some("super_secret_key".to_string()),
            ..GlassnodeConfig::default()
        };
        let debug_str = format!("{:?}", glassnode);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.name, "glassnode-mcp");
        assert_eq!(config.glassnode.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.glassnode.timeout(), Duration::from_secs(30));
        assert!(config.glassnode.api_key.is_none());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_transport_from_env() {
        use crate::core::transport::HttpConfig;

        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("MCP_TRANSPORT", "HTTP");
            std::env::set_var("MCP_HTTP_PORT", "9090");
            std::env::set_var("MCP_HTTP_PATH", "rpc");
            std::env::set_var("MCP_HTTP_CORS", "false");
        }
        let config = Config::from_env();
        assert_eq!(
            config.transport,
            TransportConfig::Http(HttpConfig {
                host: "127.0.0.1".to_string(),
                port: 9090,
                rpc_path: "/rpc".to_string(),
                enable_cors: false,
            })
        );
        clear_env();
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_unknown_transport_falls_back_to_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("MCP_TRANSPORT", "carrier-pigeon");
        }
        let config = Config::from_env();
        assert_eq!(config.transport, TransportConfig::Stdio);
        clear_env();
    }
}
