//! MCP error types.

use crate::protocol::JsonRpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to spawn server: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("server not initialized")]
    NotInitialized,

    #[error("server exited unexpectedly")]
    ServerExited,

    #[error("timeout waiting for response after {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to serialize request: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),

    #[error("tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("output too large: {size} bytes (max {max})")]
    OutputTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`ToolProvider`](crate::ToolProvider) while serving a call.
#[derive(Debug, Error)]
pub enum ToolCallError {
    /// No tool with this name is hosted.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's input schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran and failed.
    #[error("{0}")]
    Failed(String),
}
