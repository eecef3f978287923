//! Domain modules containing business logic organized by bounded contexts.
//!
//! - **glassnode**: client for the upstream Glassnode REST API
//! - **tools**: MCP tools exposed to clients, built on top of the client

pub mod glassnode;
pub mod tools;
