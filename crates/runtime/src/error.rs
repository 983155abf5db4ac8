use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("tool registry error: {0}")]
    Registry(String),

    /// The configured cap on tool invocations per query was reached.
    #[error("gave up after {0} tool calls without a final answer")]
    ToolCallLimit(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
