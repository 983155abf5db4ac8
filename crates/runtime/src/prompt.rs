//! Prompt rendering.
//!
//! The backend is a plain text-in/text-out function, so everything it needs to
//! know (which tools exist, how to ask for one, what happened so far) is folded
//! into a single prompt string.

use crate::history::ConversationHistory;
use crate::tools::ToolRegistry;

const PREAMBLE: &str = "You are an AI assistant with access to tools. \
You can call tools to help answer user questions.";

const CALL_FORMAT: &str = r#"When you need to use a tool, respond with a JSON object in this format:
{
    "action": "tool_call",
    "tool_name": "tool_name",
    "tool_args": {
        "arg1": "value1",
        "arg2": "value2"
    }
}

When you don't need to use a tool, just respond normally with text."#;

/// Cue that opens the assistant's turn. Every prompt ends with it.
pub const ASSISTANT_CUE: &str = "Assistant:";

/// Render the prompt for one backend round.
///
/// Sections, in order: instructions and the tool-call format, the tool list,
/// the history (only when non-empty), then the current query and the cue.
pub fn build_prompt(query: &str, history: &ConversationHistory, tools: &ToolRegistry) -> String {
    let mut parts: Vec<String> = vec![PREAMBLE.to_string(), String::new(), CALL_FORMAT.to_string()];

    parts.push(String::new());
    parts.push("Available tools:".to_string());
    for tool in tools {
        let schema = serde_json::to_string_pretty(&tool.input_schema)
            .unwrap_or_else(|_| tool.input_schema.to_string());
        parts.push(String::new());
        parts.push(format!("Tool: {}", tool.name));
        parts.push(format!("Description: {}", tool.description));
        parts.push(format!("Input Schema: {schema}"));
    }
    parts.push(String::new());

    if !history.is_empty() {
        parts.push("Conversation history:".to_string());
        for turn in history.iter() {
            parts.push(format!("{}: {}", turn.role.label(), turn.content));
        }
        parts.push(String::new());
    }

    parts.push(format!("User: {query}"));
    parts.push(ASSISTANT_CUE.to_string());

    parts.join("\n")
}
