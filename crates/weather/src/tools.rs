use mcp::{CallToolResult, ServerInfo, Tool, ToolCallError, ToolProvider};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::service::WeatherService;

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    location: String,
}

/// Serves `get_hourly_weather` over MCP.
pub struct WeatherTools {
    service: WeatherService,
}

impl WeatherTools {
    pub fn new(service: WeatherService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &WeatherService {
        &self.service
    }

    async fn hourly_weather(&self, arguments: Value) -> Result<String, ToolCallError> {
        let args: WeatherArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolCallError::InvalidArguments(e.to_string()))?;
        let location = args.location.trim();
        if location.is_empty() {
            return Err(ToolCallError::InvalidArguments(
                "location cannot be empty".into(),
            ));
        }

        let report = self
            .service
            .hourly_weather(location)
            .await
            .map_err(|e| ToolCallError::Failed(format!("Error fetching weather: {e}")))?;
        serde_json::to_string_pretty(&report).map_err(|e| ToolCallError::Failed(e.to_string()))
    }
}

impl ToolProvider for WeatherTools {
    fn info(&self) -> ServerInfo {
        ServerInfo {
            name: "weather".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn tools(&self) -> Vec<Tool> {
        vec![Tool::new(
            "get_hourly_weather",
            "Get current conditions and the hourly forecast for the next 12 hours at a location.",
            json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "City or place name, e.g. London"}
                },
                "required": ["location"]
            }),
        )]
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolCallError> {
        match name {
            "get_hourly_weather" => Ok(CallToolResult::text(self.hourly_weather(arguments).await?)),
            other => Err(ToolCallError::UnknownTool(other.to_string())),
        }
    }
}
