//! Text-generation backends.
//!
//! The loop treats a backend as an opaque `prompt -> completion` function.
//! There is no streaming and no retry at this layer; an error fails the
//! current query only.

mod gemini;
mod scripted;

pub use gemini::{DEFAULT_MODEL, GeminiBackend, GeminiBackendBuilder};
pub use scripted::{FALLBACK_COMPLETION, ScriptedBackend};

use crate::Result;
use std::future::Future;

/// Trait for text-generation backends.
pub trait TextBackend: Send + Sync {
    /// Produce a completion for `prompt`.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}
