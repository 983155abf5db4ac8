//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the resolution loop or its backend.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// The tool host failed while serving.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    #[error(transparent)]
    Research(#[from] research::Error),

    #[error(transparent)]
    Weather(#[from] weather::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
