//! Interpreting backend completions.
//!
//! A completion is either a final answer or a request to call a tool. The
//! request shape is a single JSON object:
//!
//! ```json
//! {"action": "tool_call", "tool_name": "search_papers", "tool_args": {"topic": "llm agents"}}
//! ```
//!
//! Any object whose `action` is `tool_call` is a request, whatever shape its
//! `tool_name` and `tool_args` have; the loop decides whether they are usable.
//! Anything else, including JSON that almost matches, is an answer. Parsing
//! never fails.

use serde_json::{Map, Value};

const TOOL_CALL_ACTION: &str = "tool_call";

/// What the backend asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// A final answer.
    Text { content: String },
    /// A request to invoke a tool, fields as the backend sent them.
    /// A missing field is `Null`.
    ToolCall { tool_name: Value, tool_args: Value },
}

impl ParsedResponse {
    pub fn is_tool_call(&self) -> bool {
        matches!(self, Self::ToolCall { .. })
    }
}

/// Name of a requested tool, if the backend sent a string.
pub fn tool_name(value: &Value) -> Option<&str> {
    value.as_str()
}

/// Arguments of a requested tool. Missing or `null` means none.
pub fn tool_args(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Null => Some(Map::new()),
        Value::Object(args) => Some(args.clone()),
        _ => None,
    }
}

/// Classify a raw completion.
///
/// The completion is trimmed first; the trimmed text is what a `Text` result
/// carries.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let trimmed = raw.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(object)) => {
            tool_call(object).unwrap_or_else(|| ParsedResponse::Text {
                content: trimmed.to_string(),
            })
        }
        _ => ParsedResponse::Text {
            content: trimmed.to_string(),
        },
    }
}

fn tool_call(mut object: Map<String, Value>) -> Option<ParsedResponse> {
    if object.get("action").and_then(Value::as_str) != Some(TOOL_CALL_ACTION) {
        return None;
    }

    Some(ParsedResponse::ToolCall {
        tool_name: object.remove("tool_name").unwrap_or(Value::Null),
        tool_args: object.remove("tool_args").unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(content: &str) -> ParsedResponse {
        ParsedResponse::Text {
            content: content.to_string(),
        }
    }

    fn call(tool_name: Value, tool_args: Value) -> ParsedResponse {
        ParsedResponse::ToolCall {
            tool_name,
            tool_args,
        }
    }

    #[test]
    fn plain_text_is_an_answer() {
        assert_eq!(parse_response("The answer is 42."), text("The answer is 42."));
    }

    #[test]
    fn minified_tool_call() {
        let raw = r#"{"action":"tool_call","tool_name":"search_papers","tool_args":{"topic":"llm agents"}}"#;
        assert_eq!(
            parse_response(raw),
            call(json!("search_papers"), json!({"topic": "llm agents"}))
        );
    }

    #[test]
    fn pretty_tool_call_with_surrounding_whitespace() {
        let raw = "\n  {\n    \"action\": \"tool_call\",\n    \"tool_name\": \"search_papers\",\n    \"tool_args\": {\n      \"topic\": \"llm agents\"\n    }\n  }\n\n";
        assert_eq!(
            parse_response(raw),
            call(json!("search_papers"), json!({"topic": "llm agents"}))
        );
    }

    #[test]
    fn missing_args_default_to_empty() {
        let parsed = parse_response(r#"{"action": "tool_call", "tool_name": "list_saved_papers"}"#);
        assert_eq!(parsed, call(json!("list_saved_papers"), Value::Null));
        assert_eq!(tool_args(&Value::Null), Some(Map::new()));
    }

    #[test]
    fn missing_or_null_name_is_still_a_tool_call() {
        for raw in [
            r#"{"action": "tool_call", "tool_args": {}}"#,
            r#"{"action": "tool_call", "tool_name": null}"#,
        ] {
            let ParsedResponse::ToolCall { tool_name: name, .. } = parse_response(raw) else {
                panic!("expected a tool call for {raw}");
            };
            assert_eq!(tool_name(&name), None);
        }
    }

    #[test]
    fn odd_shaped_fields_are_still_a_tool_call() {
        let parsed = parse_response(
            r#"{"action": "tool_call", "tool_name": "search_papers", "tool_args": "llm agents"}"#,
        );
        assert_eq!(parsed, call(json!("search_papers"), json!("llm agents")));
        assert_eq!(tool_args(&json!("llm agents")), None);
        assert_eq!(tool_args(&json!([1, 2])), None);

        let parsed = parse_response(r#"{"action": "tool_call", "tool_name": 42, "tool_args": {}}"#);
        assert_eq!(parsed, call(json!(42), json!({})));
        assert_eq!(tool_name(&json!(42)), None);
    }

    #[test]
    fn other_actions_and_shapes_are_text() {
        for raw in [
            r#"{"action": "answer", "tool_name": "search_papers"}"#,
            r#"{"tool_name": "search_papers"}"#,
            r#"{"action": "TOOL_CALL", "tool_name": "x"}"#,
            r#"[{"action": "tool_call"}]"#,
            r#""tool_call""#,
            "42",
        ] {
            assert_eq!(parse_response(raw), text(raw), "input: {raw}");
        }
    }

    #[test]
    fn malformed_json_degrades_to_text() {
        let raw = r#"{"action": "tool_call", "tool_name": "search_papers", "tool_args": {"topic": "x"}"#;
        assert_eq!(parse_response(raw), text(raw));
    }

    #[test]
    fn fenced_json_is_text() {
        let raw = "```json\n{\"action\": \"tool_call\", \"tool_name\": \"x\"}\n```";
        assert!(!parse_response(raw).is_tool_call());
    }

    #[test]
    fn text_is_trimmed_and_parse_is_idempotent() {
        let first = parse_response("  hello there \n");
        assert_eq!(first, text("hello there"));
        let ParsedResponse::Text { content } = &first else {
            unreachable!()
        };
        assert_eq!(parse_response(content), first);
    }

    #[test]
    fn empty_input_is_empty_text() {
        assert_eq!(parse_response(""), text(""));
        assert_eq!(parse_response("   "), text(""));
    }
}
