//! MCP Server Entry Point
//!
//! Loads configuration, initializes logging, builds the Glassnode client and
//! starts the server with the configured transport.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use glassnode_mcp_server::core::{Config, McpServer, TransportService};
use glassnode_mcp_server::domains::glassnode::GlassnodeClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment (and .env)
    let config = Config::from_env();

    init_logging(&config.logging.level);
    config.log_summary();

    info!("Starting {} v{}", config.server.name, config.server.version);

    // A missing API key is fatal before any transport starts
    config.validate()?;

    let client = GlassnodeClient::new(&config.glassnode)
        .context("Failed to build the Glassnode HTTP client")?;
    info!("Glassnode client ready: {}", config.glassnode.base_url);

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config, Arc::new(client));

    info!("Server initialized");

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// `MCP_LOG_LEVEL` sets the default directive; `RUST_LOG` directives, when
/// present, take precedence. Output goes to stderr to keep STDIO clean.
fn init_logging(level: &str) {
    let default_level = match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => level.to_lowercase(),
        _ => "info".to_string(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
