//! MCP server management (spawn, communicate, lifecycle).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, RequestId, Tool,
};

/// Default timeout for MCP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum output size (1MB).
/// Sized for large tool outputs (search results, forecasts).
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Configuration for an MCP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Handle to a running MCP server.
pub struct Server {
    config: ServerConfig,
    process: Mutex<Child>,
    stdin: Mutex<tokio::process::ChildStdin>,
    stdout: Mutex<BufReader<tokio::process::ChildStdout>>,
    next_id: AtomicI64,
    initialized: Mutex<bool>,
    server_info: Mutex<Option<InitializeResult>>,
    tools: Mutex<Vec<Tool>>,
}

impl Server {
    /// Spawn a new MCP server process.
    pub async fn spawn(config: ServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        debug!(server = %config.name, command = %config.command, args = ?config.args, "spawning MCP server");
        let mut process = cmd.spawn()?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdin")))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdout")))?;

        Ok(Self {
            config,
            process: Mutex::new(process),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicI64::new(1),
            initialized: Mutex::new(false),
            server_info: Mutex::new(None),
            tools: Mutex::new(Vec::new()),
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Initialize the server (must be called before other operations).
    pub async fn initialize(&self) -> Result<&Self> {
        let params = InitializeParams::default();
        let result: InitializeResult = self.request("initialize", Some(params)).await?;
        debug!(
            server = %self.config.name,
            remote = %result.server_info.name,
            protocol = %result.protocol_version,
            "MCP server initialized"
        );

        self.notify("notifications/initialized", None::<()>).await?;

        *self.server_info.lock().await = Some(result);
        *self.initialized.lock().await = true;

        self.refresh_tools().await?;

        Ok(self)
    }

    /// Check if the server is initialized.
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.lock().await
    }

    /// Get server info (after initialization).
    pub async fn server_info(&self) -> Option<InitializeResult> {
        self.server_info.lock().await.clone()
    }

    /// Refresh the list of available tools.
    pub async fn refresh_tools(&self) -> Result<()> {
        let result: ListToolsResult = self.request("tools/list", None::<()>).await?;
        *self.tools.lock().await = result.tools;
        Ok(())
    }

    /// Get the list of available tools, in the order the server advertised them.
    pub async fn tools(&self) -> Vec<Tool> {
        self.tools.lock().await.clone()
    }

    /// Call a tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        if !*self.initialized.lock().await {
            return Err(Error::NotInitialized);
        }

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let result: CallToolResult = self.request("tools/call", Some(params)).await?;

        if result.is_error {
            return Err(Error::ToolCallFailed(result.joined_text()));
        }

        Ok(result)
    }

    /// Check if the server process is still running.
    pub async fn is_running(&self) -> bool {
        let mut process = self.process.lock().await;
        matches!(process.try_wait(), Ok(None))
    }

    /// Shut down the server.
    pub async fn shutdown(self) -> Result<()> {
        let mut process = self.process.lock().await;
        let _ = process.kill().await;
        debug!(server = %self.config.name, "MCP server stopped");
        Ok(())
    }

    // --- Internal methods ---

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        self.send(&request).await?;

        let wait = self.config.timeout;
        let response = timeout(wait, self.read_response(&id))
            .await
            .map_err(|_| Error::Timeout(wait))??;

        let result_value = response.into_result()?;
        let result: R = serde_json::from_value(result_value)?;

        Ok(result)
    }

    async fn notify<P>(&self, method: &str, params: Option<P>) -> Result<()>
    where
        P: serde::Serialize,
    {
        let mut notification = JsonRpcRequest::notification(method);
        if let Some(p) = params {
            notification = notification.with_params(p);
        }
        self.send(&notification).await
    }

    async fn send(&self, message: &JsonRpcRequest) -> Result<()> {
        let json = serde_json::to_string(message)?;
        trace!(server = %self.config.name, %json, "-> MCP");
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(json.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read lines until the response for `id` arrives, skipping server notifications.
    async fn read_response(&self, id: &RequestId) -> Result<JsonRpcResponse> {
        let mut stdout = self.stdout.lock().await;
        loop {
            let mut line = String::new();
            let bytes_read = stdout.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Err(Error::ServerExited);
            }

            if line.len() > MAX_OUTPUT_SIZE {
                return Err(Error::OutputTooLarge {
                    size: line.len(),
                    max: MAX_OUTPUT_SIZE,
                });
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace!(server = %self.config.name, json = %line, "<- MCP");

            let value: serde_json::Value = serde_json::from_str(line)?;
            if value.get("id").is_none_or(|v| v.is_null()) && value.get("method").is_some() {
                debug!(server = %self.config.name, "skipping server notification");
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(value)?;
            match &response.id {
                Some(got) if got == id => return Ok(response),
                // Late reply to a request that already timed out.
                Some(stale) => {
                    warn!(server = %self.config.name, expected = ?id, got = ?stale, "discarding stale response");
                }
                None => {
                    return Err(Error::InvalidResponse(format!(
                        "response without ID while waiting for {id:?}"
                    )));
                }
            }
        }
    }
}
