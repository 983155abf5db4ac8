//! Hosting tools over stdio (the server side of the protocol).

use std::future::Future;

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::{Result, ToolCallError};
use crate::protocol::{
    CallToolParams, CallToolResult, INVALID_PARAMS, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, METHOD_NOT_FOUND, PARSE_ERROR,
    PROTOCOL_VERSION, ServerCapabilities, ServerInfo, Tool,
};

/// A set of tools that can be served to an MCP client.
pub trait ToolProvider: Send + Sync {
    /// Identity reported in the `initialize` handshake.
    fn info(&self) -> ServerInfo;

    /// Tools advertised by `tools/list`, in a stable order.
    fn tools(&self) -> Vec<Tool>;

    /// Execute one tool call.
    fn call(
        &self,
        name: &str,
        arguments: Value,
    ) -> impl Future<Output = std::result::Result<CallToolResult, ToolCallError>> + Send;
}

/// Serve `provider` over newline-delimited JSON-RPC until `reader` hits EOF.
pub async fn serve<P, R, W>(provider: &P, reader: R, mut writer: W) -> Result<()>
where
    P: ToolProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("undecodable request: {e}");
                let response =
                    JsonRpcResponse::failure(None, JsonRpcError::new(PARSE_ERROR, e.to_string()));
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        if request.is_notification() {
            debug!(method = %request.method, "notification");
            continue;
        }

        let response = dispatch(provider, request).await;
        write_response(&mut writer, &response).await?;
    }

    debug!("client closed the connection");
    Ok(())
}

/// Serve `provider` over this process's stdin and stdout.
pub async fn serve_stdio<P: ToolProvider>(provider: &P) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(provider, stdin, stdout).await
}

async fn dispatch<P: ToolProvider>(provider: &P, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone();
    match request.method.as_str() {
        "initialize" => {
            let result = InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities::tools_only(),
                server_info: provider.info(),
            };
            to_response(id, &result)
        }
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => to_response(
            id,
            &ListToolsResult {
                tools: provider.tools(),
            },
        ),
        "tools/call" => {
            let params: CallToolParams =
                match serde_json::from_value(request.params.unwrap_or(Value::Null)) {
                    Ok(params) => params,
                    Err(e) => {
                        return JsonRpcResponse::failure(
                            id,
                            JsonRpcError::new(INVALID_PARAMS, e.to_string()),
                        );
                    }
                };
            let arguments = params.arguments.unwrap_or_else(|| json!({}));
            debug!(tool = %params.name, %arguments, "tool call");

            match provider.call(&params.name, arguments).await {
                Ok(result) => to_response(id, &result),
                Err(e @ ToolCallError::UnknownTool(_)) => {
                    JsonRpcResponse::failure(id, JsonRpcError::new(INVALID_PARAMS, e.to_string()))
                }
                Err(e) => {
                    warn!(tool = %params.name, "tool failed: {e}");
                    to_response(id, &CallToolResult::error(e.to_string()))
                }
            }
        }
        other => JsonRpcResponse::failure(
            id,
            JsonRpcError::new(METHOD_NOT_FOUND, format!("method not found: {other}")),
        ),
    }
}

fn to_response<T: serde::Serialize>(
    id: Option<crate::RequestId>,
    result: &T,
) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::failure(id, JsonRpcError::new(-32603, e.to_string())),
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
