//! A provider served over in-memory pipes, driven request by request.

use std::sync::atomic::{AtomicUsize, Ordering};

use mcp::{
    CallToolResult, INVALID_PARAMS, JsonRpcResponse, ListToolsResult, RequestId, ServerInfo, Tool,
    ToolCallError, ToolProvider, serve,
};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

#[derive(Default)]
struct Counter {
    hits: AtomicUsize,
}

impl ToolProvider for Counter {
    fn info(&self) -> ServerInfo {
        ServerInfo {
            name: "counter".to_string(),
            version: None,
        }
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool::new("bump", "Increment and return the counter", json!({"type": "object"})),
            Tool::new("explode", "Always fails", json!({"type": "object"})),
        ]
    }

    async fn call(&self, name: &str, _arguments: Value) -> Result<CallToolResult, ToolCallError> {
        match name {
            "bump" => {
                let n = self.hits.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(CallToolResult::text(n.to_string()))
            }
            "explode" => Err(ToolCallError::Failed("boom".into())),
            other => Err(ToolCallError::UnknownTool(other.to_string())),
        }
    }
}

struct Client {
    writer: DuplexStream,
    lines: Lines<BufReader<DuplexStream>>,
}

impl Client {
    async fn request(&mut self, request: Value) -> JsonRpcResponse {
        let mut line = request.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
        let reply = self.lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&reply).unwrap()
    }

    async fn notify(&mut self, method: &str) {
        let line = format!("{}\n", json!({"jsonrpc": "2.0", "method": method}));
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }
}

fn call(id: i64, name: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "tools/call", "params": {"name": name}})
}

#[tokio::test]
async fn session_over_duplex_pipes() {
    let (client_out, server_in) = tokio::io::duplex(8 * 1024);
    let (server_out, client_in) = tokio::io::duplex(8 * 1024);
    let provider = Counter::default();

    let server = serve(&provider, BufReader::new(server_in), server_out);
    let client = async move {
        let mut client = Client {
            writer: client_out,
            lines: BufReader::new(client_in).lines(),
        };

        let init = client
            .request(json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {"protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": {"name": "test", "version": "0"}}
            }))
            .await;
        assert_eq!(init.into_result().unwrap()["serverInfo"]["name"], "counter");
        client.notify("notifications/initialized").await;

        let list = client
            .request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
            .await;
        let list: ListToolsResult = serde_json::from_value(list.into_result().unwrap()).unwrap();
        assert_eq!(list.tools.len(), 2);

        for expected in ["1", "2"] {
            let bumped = client.request(call(3, "bump")).await;
            let bumped: CallToolResult =
                serde_json::from_value(bumped.into_result().unwrap()).unwrap();
            assert_eq!(bumped.joined_text(), expected);
        }

        let failed = client.request(call(4, "explode")).await;
        let failed: CallToolResult = serde_json::from_value(failed.into_result().unwrap()).unwrap();
        assert!(failed.is_error);
        assert_eq!(failed.joined_text(), "boom");

        let unknown = client.request(call(5, "vanish")).await;
        assert_eq!(unknown.id, Some(RequestId::Number(5)));
        let error = unknown.into_result().unwrap_err();
        assert_eq!(error.code, INVALID_PARAMS);
        assert_eq!(error.message, "unknown tool: vanish");

        let pong = client
            .request(json!({"jsonrpc": "2.0", "id": "p", "method": "ping"}))
            .await;
        assert_eq!(pong.id, Some(RequestId::from("p")));
        // Dropping the client closes the pipe and ends the server loop.
    };

    let (served, ()) = tokio::join!(server, client);
    served.unwrap();
    assert_eq!(provider.hits.load(Ordering::SeqCst), 2);
}
