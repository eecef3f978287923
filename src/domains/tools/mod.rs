//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are the operations MCP clients call; every tool here is a
//! read-only view on the Glassnode API.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `handlers.rs` - `GlassnodeTool` trait, argument validation, result shaping
//! - `router.rs` - Dynamic ToolRouter builder for STDIO/TCP transport
//! - `registry.rs` - Central tool registry and HTTP dispatch
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/glassnode/` with params, output and
//!    a `GlassnodeTool` impl
//! 2. Export it in `definitions/mod.rs`
//! 3. Add its route in `router.rs`
//! 4. Register it in `registry.rs` (`tool_names`, `get_all_tools`, `dispatch`, `call_tool`)

pub mod definitions;
mod error;
pub mod handlers;
mod registry;
pub mod router;

pub use error::ToolError;
pub use handlers::{GlassnodeTool, Validate};
pub use registry::ToolRegistry;
pub use router::build_tool_router;
