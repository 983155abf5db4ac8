use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("arXiv API error: {0}")]
    Api(String),

    #[error("failed to parse feed: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
