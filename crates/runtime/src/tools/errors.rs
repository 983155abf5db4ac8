use thiserror::Error;

/// Why a tool invocation produced no result.
///
/// Failures are ordinary values at the loop seam: the resolver records them in
/// the history and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolFailure {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("no tool name given")]
    MissingName,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Execution(String),
    #[error("transport: {0}")]
    Transport(String),
}
