//! Tool invoker trait.

use std::future::Future;

use serde_json::{Map, Value};

use crate::tools::{ToolDescriptor, ToolFailure, ToolOutput};

/// The boundary between the query-resolution loop and tool side effects.
///
/// Implementations list the tools they host and execute calls by name.
pub trait ToolInvoker: Send + Sync {
    /// Tools advertised by the host, in order.
    fn list_tools(&self) -> impl Future<Output = crate::Result<Vec<ToolDescriptor>>> + Send;

    /// Execute one tool call.
    fn call_tool(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> impl Future<Output = Result<ToolOutput, ToolFailure>> + Send;
}
