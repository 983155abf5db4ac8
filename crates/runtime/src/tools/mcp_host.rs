//! MCP-backed tool invoker.

use mcp::{Server, ServerConfig};
use serde_json::{Map, Value};
use tracing::debug;

use super::{ToolDescriptor, ToolFailure, ToolInvoker, ToolOutput};
use crate::{Error, Result};

/// Tool invoker backed by a spawned MCP server.
pub struct McpToolInvoker {
    server: Server,
}

impl McpToolInvoker {
    /// Spawn and initialize the MCP server.
    pub async fn spawn(config: ServerConfig) -> Result<Self> {
        let name = config.name.clone();
        let server = Server::spawn(config)
            .await
            .map_err(|e| Error::Registry(format!("failed to spawn MCP server {name}: {e}")))?;
        server
            .initialize()
            .await
            .map_err(|e| Error::Registry(format!("failed to initialize MCP server {name}: {e}")))?;
        Ok(Self { server })
    }

    pub fn server_name(&self) -> &str {
        self.server.name()
    }

    /// Terminate the server process.
    pub async fn shutdown(self) {
        let _ = self.server.shutdown().await;
    }
}

impl ToolInvoker for McpToolInvoker {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self
            .server
            .tools()
            .await
            .into_iter()
            .map(ToolDescriptor::from)
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> std::result::Result<ToolOutput, ToolFailure> {
        debug!(server = %self.server.name(), tool = %name, "calling tool");
        let result = self
            .server
            .call_tool(name, Some(Value::Object(args.clone())))
            .await
            .map_err(failure_from_mcp)?;
        Ok(ToolOutput {
            content: result.content,
        })
    }
}

fn failure_from_mcp(error: mcp::Error) -> ToolFailure {
    match error {
        mcp::Error::ToolCallFailed(message) => ToolFailure::Execution(message),
        mcp::Error::JsonRpc(e) if e.code == mcp::INVALID_PARAMS => {
            match e.message.strip_prefix("unknown tool: ") {
                Some(name) => ToolFailure::NotFound(name.to_string()),
                None => ToolFailure::InvalidInput(e.message),
            }
        }
        e @ mcp::Error::Timeout(_) => ToolFailure::Timeout(e.to_string()),
        other => ToolFailure::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_mcp_errors_to_failures() {
        assert_eq!(
            failure_from_mcp(mcp::Error::ToolCallFailed("no such topic".into())),
            ToolFailure::Execution("no such topic".into())
        );
        assert_eq!(
            failure_from_mcp(mcp::Error::JsonRpc(mcp::JsonRpcError::new(
                mcp::INVALID_PARAMS,
                "unknown tool: nope"
            ))),
            ToolFailure::NotFound("nope".into())
        );
        assert_eq!(
            failure_from_mcp(mcp::Error::JsonRpc(mcp::JsonRpcError::new(
                mcp::INVALID_PARAMS,
                "missing field `name`"
            ))),
            ToolFailure::InvalidInput("missing field `name`".into())
        );
        assert!(matches!(
            failure_from_mcp(mcp::Error::ServerExited),
            ToolFailure::Transport(_)
        ));
    }
}
