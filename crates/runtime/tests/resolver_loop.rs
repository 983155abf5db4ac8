//! End-to-end behavior of the query-resolution loop against scripted
//! collaborators.

use std::collections::VecDeque;
use std::sync::Mutex;

use runtime::{
    ConversationTurn, LoopEvent, LoopObserver, QueryResolver, ScriptedBackend, ToolDescriptor,
    ToolFailure, ToolInvoker, ToolOutput, TurnRole,
};
use serde_json::{Map, Value, json};

const SEARCH_CALL: &str = r#"{"action": "tool_call", "tool_name": "search_papers", "tool_args": {"topic": "diffusion models"}}"#;

/// Invoker that replays canned outcomes and records every call.
#[derive(Default)]
struct FakeTools {
    outcomes: Mutex<VecDeque<Result<ToolOutput, ToolFailure>>>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl FakeTools {
    fn with(outcomes: impl IntoIterator<Item = Result<ToolOutput, ToolFailure>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::default(),
        }
    }

    fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolInvoker for FakeTools {
    async fn list_tools(&self) -> runtime::Result<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new(
                "search_papers",
                "Search for papers on arXiv based on a topic.",
                json!({"type": "object", "properties": {"topic": {"type": "string"}}, "required": ["topic"]}),
            ),
            ToolDescriptor::new(
                "extract_info",
                "Look up a saved paper.",
                json!({"type": "object", "properties": {"paper_id": {"type": "string"}}}),
            ),
        ])
    }

    async fn call_tool(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<ToolOutput, ToolFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), args.clone()));
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ToolOutput::text("[]")))
    }
}

#[derive(Default)]
struct Transcript(Vec<String>);

impl LoopObserver for Transcript {
    fn on_event(&mut self, event: &LoopEvent<'_>) {
        let line = match event {
            LoopEvent::ToolCall { name, .. } => format!("call {name}"),
            LoopEvent::ToolResult { name, .. } => format!("result {name}"),
            LoopEvent::ToolError { name, .. } => format!("error {name}"),
            LoopEvent::Answer { content } => format!("answer {content}"),
        };
        self.0.push(line);
    }
}

#[tokio::test]
async fn tool_call_then_answer() {
    let backend = ScriptedBackend::new([SEARCH_CALL, "Here are three papers on diffusion models."]);
    let tools = FakeTools::with([Ok(ToolOutput::text(r#"["2401.00001", "2401.00002"]"#))]);
    let resolver = QueryResolver::connect(backend, tools).await.unwrap();

    let mut transcript = Transcript::default();
    let resolution = resolver
        .resolve_with("What papers exist on diffusion models?", &mut transcript)
        .await
        .unwrap();

    assert_eq!(resolution.answer, "Here are three papers on diffusion models.");
    assert_eq!(resolution.tool_calls, 1);
    assert_eq!(resolution.completions, 2);

    let calls = resolver.invoker().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "search_papers");
    assert_eq!(calls[0].1["topic"], "diffusion models");

    assert_eq!(
        resolution.history.turns(),
        &[
            ConversationTurn::assistant(
                "I need to use the search_papers tool to help answer your question."
            ),
            ConversationTurn::tool_result(r#"["2401.00001", "2401.00002"]"#),
        ]
    );
    assert_eq!(resolution.history.with_role(TurnRole::ToolResult).count(), 1);

    assert_eq!(
        transcript.0,
        vec![
            "call search_papers",
            "result search_papers",
            "answer Here are three papers on diffusion models.",
        ]
    );
}

#[tokio::test]
async fn second_prompt_carries_result_and_original_query() {
    let backend = ScriptedBackend::new([SEARCH_CALL, "done"]);
    let tools = FakeTools::with([Ok(ToolOutput::text("RESULT-PAYLOAD"))]);
    let resolver = QueryResolver::connect(backend, tools).await.unwrap();

    resolver
        .resolve("What papers exist on diffusion models?")
        .await
        .unwrap();

    let prompts = resolver.backend().prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].ends_with("User: What papers exist on diffusion models?\nAssistant:"));
    assert!(prompts[1].contains("Tool result: RESULT-PAYLOAD"));
    assert!(prompts[1].contains(
        "original question: 'What papers exist on diffusion models?'"
    ));
}

#[tokio::test]
async fn tool_failure_asks_the_backend_again() {
    let backend = ScriptedBackend::new([SEARCH_CALL, "I could not search right now."]);
    let tools = FakeTools::with([Err(ToolFailure::Execution("arXiv unreachable".into()))]);
    let resolver = QueryResolver::connect(backend, tools).await.unwrap();

    let resolution = resolver
        .resolve("What papers exist on diffusion models?")
        .await
        .unwrap();

    assert_eq!(resolution.answer, "I could not search right now.");
    let prompts = resolver.backend().prompts();
    assert_eq!(prompts.len(), 2);
    let retry = &prompts[1];
    assert!(retry.contains("What papers exist on diffusion models?"));
    assert!(retry.contains("Error calling tool search_papers: arXiv unreachable"));
    assert!(retry.contains("Tool result: Error: Error calling tool search_papers: arXiv unreachable"));
}

#[tokio::test]
async fn repeated_failures_keep_the_loop_going() {
    let backend = ScriptedBackend::new([SEARCH_CALL, SEARCH_CALL, SEARCH_CALL, "giving up politely"]);
    let tools = FakeTools::with([
        Err(ToolFailure::Timeout("60s".into())),
        Err(ToolFailure::Timeout("60s".into())),
        Ok(ToolOutput::text("finally")),
    ]);
    let resolver = QueryResolver::connect(backend, tools).await.unwrap();

    let resolution = resolver.resolve("q").await.unwrap();
    assert_eq!(resolution.answer, "giving up politely");
    assert_eq!(resolution.tool_calls, 3);
    assert_eq!(resolution.history.len(), 6);

    // Every follow-up quotes the query captured at entry.
    for prompt in &resolver.backend().prompts()[1..] {
        assert!(prompt.contains("'q'"));
    }
}

#[tokio::test]
async fn unknown_tools_are_forwarded_to_the_host() {
    let call = r#"{"action": "tool_call", "tool_name": "teleport", "tool_args": {}}"#;
    let backend = ScriptedBackend::new([call, "ok"]);
    let tools = FakeTools::with([Err(ToolFailure::NotFound("teleport".into()))]);
    let resolver = QueryResolver::connect(backend, tools).await.unwrap();

    let resolution = resolver.resolve("beam me up").await.unwrap();
    assert_eq!(resolver.invoker().calls()[0].0, "teleport");
    assert_eq!(
        resolution.history.turns()[1].content,
        "Error: Error calling tool teleport: tool not found: teleport"
    );
}

#[tokio::test]
async fn backend_failure_fails_only_that_query() {
    let backend = ScriptedBackend::default();
    backend.push_failure("503 Service Unavailable");
    backend.push_reply("second query works");
    let resolver = QueryResolver::connect(backend, FakeTools::default())
        .await
        .unwrap();

    let err = resolver.resolve("first").await.unwrap_err();
    assert!(err.to_string().contains("503"));

    let resolution = resolver.resolve("second").await.unwrap();
    assert_eq!(resolution.answer, "second query works");
}

#[tokio::test]
async fn queries_do_not_share_history() {
    let backend = ScriptedBackend::new([SEARCH_CALL, "first answer", "second answer"]);
    let tools = FakeTools::with([Ok(ToolOutput::text("FIRST-QUERY-RESULT"))]);
    let resolver = QueryResolver::connect(backend, tools).await.unwrap();

    resolver.resolve("first question").await.unwrap();
    let second = resolver.resolve("second question").await.unwrap();
    assert!(second.history.is_empty());

    let prompts = resolver.backend().prompts();
    let second_first_prompt = &prompts[2];
    assert!(!second_first_prompt.contains("Conversation history:"));
    assert!(!second_first_prompt.contains("FIRST-QUERY-RESULT"));
    assert!(!second_first_prompt.contains("first question"));
    assert!(second_first_prompt.ends_with("User: second question\nAssistant:"));
}

#[tokio::test]
async fn malformed_tool_call_is_returned_as_the_answer() {
    let broken = r#"{"action": "tool_call", "tool_name": "search_papers""#;
    let backend = ScriptedBackend::new([broken]);
    let resolver = QueryResolver::connect(backend, FakeTools::default())
        .await
        .unwrap();

    let resolution = resolver.resolve("q").await.unwrap();
    assert_eq!(resolution.answer, broken);
    assert!(resolver.invoker().calls().is_empty());
}

#[tokio::test]
async fn non_object_arguments_are_a_recorded_failure() {
    let call = r#"{"action": "tool_call", "tool_name": "search_papers", "tool_args": "diffusion models"}"#;
    let backend = ScriptedBackend::new([call, "Please give me a topic."]);
    let resolver = QueryResolver::connect(backend, FakeTools::default())
        .await
        .unwrap();

    let mut transcript = Transcript::default();
    let resolution = resolver.resolve_with("q", &mut transcript).await.unwrap();

    assert_eq!(resolution.answer, "Please give me a topic.");
    assert_eq!(resolution.completions, 2);
    assert!(resolver.invoker().calls().is_empty());
    assert_eq!(
        resolution.history.turns()[1].content,
        "Error: Error calling tool search_papers: invalid input: tool_args must be an object"
    );
    assert_eq!(
        transcript.0,
        vec![
            "call search_papers",
            "error search_papers",
            "answer Please give me a topic.",
        ]
    );
}
