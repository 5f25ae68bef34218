//! Error types for the MCP bridge.

use thiserror::Error;

/// Errors that can occur in the MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// Tool not found.
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },

    /// Invalid arguments for a tool.
    #[error("invalid arguments for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error on the stdio transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
