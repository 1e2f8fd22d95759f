//! Error types for the MCP server

use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors raised while assembling the tool surface.
#[derive(Debug, Error)]
pub enum Error {
    /// A requested toolset name matches no registered toolset
    #[error("unknown toolset: {0}")]
    UnknownToolset(String),

    /// Two toolsets registered under the same name
    #[error("toolset already registered: {0}")]
    DuplicateToolset(String),

    /// Two tools registered on the server under the same name
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
}
