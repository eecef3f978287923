//! Transport configuration types.

/// Which transport the server listens on, with its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// One rmcp session per accepted TCP connection.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// JSON-RPC over HTTP POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpConfig {
    pub host: String,
    pub port: u16,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,

    /// Path of the JSON-RPC endpoint.
    pub rpc_path: String,

    /// Allow any origin (browser clients).
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
const DEFAULT_HOST: &str = "127.0.0.1";

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 3000,
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 8080,
            rpc_path: "/mcp".to_string(),
            enable_cors: true,
        }
    }
}

#[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");

impl Default for TransportConfig {
    #[cfg(feature = "stdio")]
    fn default() -> Self {
        Self::Stdio
    }

    #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
    fn default() -> Self {
        Self::Tcp(TcpConfig::default())
    }

    #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
    fn default() -> Self {
        Self::Http(HttpConfig::default())
    }
}

impl TransportConfig {
    /// Load transport config from environment variables.
    ///
    /// `MCP_TRANSPORT` selects the transport; a value naming a transport
    /// that was not compiled in falls back to the default one.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "tcp")]
            "tcp" => {
                let defaults = TcpConfig::default();
                Self::Tcp(TcpConfig {
                    host: std::env::var("MCP_TCP_HOST").unwrap_or(defaults.host),
                    port: env_port("MCP_TCP_PORT", defaults.port),
                })
            }
            #[cfg(feature = "http")]
            "http" => {
                let defaults = HttpConfig::default();
                Self::Http(HttpConfig {
                    host: std::env::var("MCP_HTTP_HOST").unwrap_or(defaults.host),
                    port: env_port("MCP_HTTP_PORT", defaults.port),
                    rpc_path: std::env::var("MCP_HTTP_PATH")
                        .map(|p| normalize_rpc_path(&p))
                        .unwrap_or(defaults.rpc_path),
                    enable_cors: std::env::var("MCP_HTTP_CORS")
                        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
                        .unwrap_or(defaults.enable_cors),
                })
            }
            _ => Self::default(),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn env_port(name: &str, default: u16) -> u16 {
    std::env::var(name)
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(default)
}

/// Ensure the JSON-RPC path starts with a slash.
#[cfg(feature = "http")]
fn normalize_rpc_path(raw: &str) -> String {
    let path = raw.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "stdio")]
    #[test]
    fn test_default_is_stdio() {
        assert_eq!(TransportConfig::default(), TransportConfig::Stdio);
        assert_eq!(
            TransportConfig::default().description(),
            "STDIO (standard MCP mode)"
        );
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_rpc_path_is_normalized() {
        assert_eq!(normalize_rpc_path("rpc"), "/rpc");
        assert_eq!(normalize_rpc_path(" /mcp "), "/mcp");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_description() {
        let config = TransportConfig::Http(HttpConfig::default());
        assert_eq!(config.description(), "HTTP on 127.0.0.1:8080/mcp");
    }
}
