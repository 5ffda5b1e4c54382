//! Error types for the agent-tool transport.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, McpToolError>;

#[derive(Debug, Error)]
pub enum McpToolError {
    #[error("search failed: {0}")]
    Search(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),
}

impl McpToolError {
    pub fn to_tool_error_message(&self) -> String {
        match self {
            McpToolError::Search(msg) => format!("Search failed: {msg}"),
            McpToolError::Serialization(e) => format!("Failed to format results: {e}"),
            McpToolError::Transport(msg) => format!("Transport error: {msg}"),
        }
    }
}
