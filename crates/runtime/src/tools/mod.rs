//! Tool registry and the tool invocation boundary.

pub mod errors;
mod invoker;
mod mcp_host;
mod registry;
mod types;

pub use errors::ToolFailure;
pub use invoker::ToolInvoker;
pub use mcp_host::McpToolInvoker;
pub use registry::ToolRegistry;
pub use types::{ToolDescriptor, ToolOutput};
