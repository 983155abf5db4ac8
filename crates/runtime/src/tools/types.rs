//! Tool-related types.

use mcp::{Tool, ToolContent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool advertised by the tool host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            input_schema: tool.input_schema,
        }
    }
}

/// Successful payload of a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: Vec<ToolContent>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }

    /// Flatten the payload into the text recorded in the conversation.
    ///
    /// Text blocks are joined by newlines; any other block is rendered as JSON.
    pub fn render(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ToolContent::Text { text } => text.clone(),
                other => serde_json::to_string(other).unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
