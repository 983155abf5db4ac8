//! MCP (Model Context Protocol) over stdio.
//!
//! Both halves of the tool boundary live here: [`Server`] spawns a
//! tool-hosting process and talks to it as a client, while [`serve`] and
//! [`serve_stdio`] expose a [`ToolProvider`] to such a client.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Server, ServerConfig};
//!
//! # async fn example() -> mcp::Result<()> {
//! let config = ServerConfig::new("research", "relay").with_args(["serve", "research"]);
//!
//! let server = Server::spawn(config).await?;
//! server.initialize().await?;
//!
//! for tool in server.tools().await {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let result = server
//!     .call_tool("search_papers", Some(serde_json::json!({"topic": "llm agents"})))
//!     .await?;
//! println!("{}", result.joined_text());
//!
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod host;
mod protocol;
mod server;

pub use error::{Error, Result, ToolCallError};
pub use host::{ToolProvider, serve, serve_stdio};
pub use protocol::{
    CallToolParams, CallToolResult, EmbeddedResource, INVALID_PARAMS, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, RequestId, ServerCapabilities, ServerInfo,
    Tool, ToolContent,
};
pub use server::{DEFAULT_TIMEOUT, MAX_OUTPUT_SIZE, Server, ServerConfig};
