//! Glassnode MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing read-only Glassnode API
//! data (assets, metrics, metric metadata and time series) as tools for
//! language-model agents.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling, the main server
//!   and the transports (STDIO, TCP, HTTP)
//! - **domains**: Business logic organized by bounded contexts
//!   - **glassnode**: Upstream REST client, typed models and errors
//!   - **tools**: The MCP tools, their validation and dispatch
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use glassnode_mcp_server::core::{Config, McpServer, TransportService};
//! use glassnode_mcp_server::domains::glassnode::GlassnodeClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     config.validate()?;
//!     let client = Arc::new(GlassnodeClient::new(&config.glassnode)?);
//!     let transport = TransportService::new(config.transport.clone());
//!     transport.run(McpServer::new(config, client)).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
