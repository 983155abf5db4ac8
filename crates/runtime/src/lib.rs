//! Relay runtime: the query-resolution core.
//!
//! This crate turns one natural-language query into zero or more tool
//! invocations and a final answer. It owns no transport and no tool
//! implementations; those sit behind two traits:
//!
//! - [`TextBackend`]: `prompt -> completion` ([`GeminiBackend`], [`ScriptedBackend`]).
//! - [`ToolInvoker`]: lists tools once and executes calls by name ([`McpToolInvoker`]).
//!
//! Each round the [`QueryResolver`] renders a prompt ([`build_prompt`]), asks
//! the backend, classifies the completion ([`parse_response`]) and either
//! returns the answer or runs the requested tool and goes around again.
//!
//! # Example
//!
//! ```ignore
//! use mcp::ServerConfig;
//! use runtime::{GeminiBackend, McpToolInvoker, QueryResolver};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = GeminiBackend::from_env()?;
//! let tools = McpToolInvoker::spawn(
//!     ServerConfig::new("research", "relay").with_args(["serve", "research"]),
//! )
//! .await?;
//!
//! let resolver = QueryResolver::connect(backend, tools).await?;
//! let resolution = resolver.resolve("What papers exist on diffusion models?").await?;
//! println!("{}", resolution.answer);
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
pub mod history;
pub mod interpret;
pub mod prompt;
mod resolver;
pub mod tools;

pub use backend::{
    DEFAULT_MODEL, FALLBACK_COMPLETION, GeminiBackend, GeminiBackendBuilder, ScriptedBackend,
    TextBackend,
};
pub use error::{Error, Result};
pub use history::{ConversationHistory, ConversationTurn, TurnRole};
pub use interpret::{ParsedResponse, parse_response};
pub use prompt::{ASSISTANT_CUE, build_prompt};
pub use resolver::{
    LoopEvent, LoopObserver, QueryResolver, Resolution, ResolverOptions, failure_follow_up,
    success_follow_up,
};
pub use tools::{
    McpToolInvoker, ToolDescriptor, ToolFailure, ToolInvoker, ToolOutput, ToolRegistry,
};
