//! MCP server exposing Kubernetes tools.
//!
//! Tools are grouped into toolsets ([`toolsets`]) that the operator enables by
//! name at startup, optionally restricted to read-only tools. The enabled
//! tools are registered on an [`McpServer`], which transports drive with raw
//! JSON-RPC messages.

pub mod error;
pub mod kubernetes;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod toolsets;

pub use error::{Error, Result};
pub use kubernetes::{init_toolsets, DEFAULT_TOOLSETS};
pub use server::{McpServer, SERVER_NAME};
pub use toolsets::{Toolset, ToolsetGroup, ALL_TOOLSETS};
