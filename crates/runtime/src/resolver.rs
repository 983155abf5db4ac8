//! The query-resolution loop.
//!
//! One call to [`QueryResolver::resolve`] turns a user query into a final
//! answer, invoking tools in between as often as the backend asks:
//!
//! ```text
//! Prompting -> AwaitingCompletion -> Dispatching -> Answered
//!                                         |
//!                                         v
//!                 Prompting <- Recording <- InvokingTool
//! ```
//!
//! `Answered` is the only exit besides a backend error (or the optional
//! tool-call cap). Tool failures are recorded and the backend is asked again.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::TextBackend;
use crate::history::{ConversationHistory, ConversationTurn};
use crate::interpret::{ParsedResponse, parse_response, tool_args, tool_name};
use crate::prompt::build_prompt;
use crate::tools::{ToolFailure, ToolInvoker, ToolRegistry};
use crate::{Error, Result};

/// Tuning knobs for the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Give up once this many tools have been invoked for one query.
    /// `None` never gives up.
    pub max_tool_calls: Option<usize>,
}

/// Progress reported while a query is being resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent<'a> {
    ToolCall {
        name: &'a str,
        args: &'a Value,
    },
    ToolResult {
        name: &'a str,
        content: &'a str,
    },
    ToolError {
        name: &'a str,
        message: &'a str,
    },
    Answer {
        content: &'a str,
    },
}

/// Receives [`LoopEvent`]s as they happen.
pub trait LoopObserver {
    fn on_event(&mut self, event: &LoopEvent<'_>);
}

impl LoopObserver for () {
    fn on_event(&mut self, _event: &LoopEvent<'_>) {}
}

/// Outcome of a resolved query.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub answer: String,
    /// Turns recorded while resolving; discarded by the loop afterwards.
    pub history: ConversationHistory,
    /// Tool invocations attempted.
    pub tool_calls: usize,
    /// Completions requested from the backend.
    pub completions: usize,
}

enum State {
    Prompting,
    AwaitingCompletion(String),
    Dispatching(String),
    InvokingTool {
        name: Value,
        args: Value,
    },
    Recording {
        turn: ConversationTurn,
        next_query: String,
    },
    Answered(String),
}

/// Drives backend and tools until the backend answers in plain text.
pub struct QueryResolver<B, T> {
    backend: B,
    invoker: T,
    registry: ToolRegistry,
    options: ResolverOptions,
}

impl<B: TextBackend, T: ToolInvoker> QueryResolver<B, T> {
    /// Create a resolver over an already-built registry.
    pub fn new(backend: B, invoker: T, registry: ToolRegistry) -> Self {
        Self {
            backend,
            invoker,
            registry,
            options: ResolverOptions::default(),
        }
    }

    /// Create a resolver, asking the invoker once for its tool list.
    pub async fn connect(backend: B, invoker: T) -> Result<Self> {
        let registry = ToolRegistry::from_tools(invoker.list_tools().await?);
        info!(tools = ?registry.names(), "tool registry loaded");
        Ok(Self::new(backend, invoker, registry))
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn invoker(&self) -> &T {
        &self.invoker
    }

    pub fn into_parts(self) -> (B, T) {
        (self.backend, self.invoker)
    }

    /// Resolve a query without observing progress.
    pub async fn resolve(&self, query: &str) -> Result<Resolution> {
        self.resolve_with(query, &mut ()).await
    }

    /// Resolve a query, reporting tool activity and the answer to `observer`.
    pub async fn resolve_with<O: LoopObserver>(
        &self,
        query: &str,
        observer: &mut O,
    ) -> Result<Resolution> {
        let original_query = query;
        let mut current_query = query.to_string();
        let mut history = ConversationHistory::new();
        let mut tool_calls = 0usize;
        let mut completions = 0usize;
        let mut state = State::Prompting;

        loop {
            state = match state {
                State::Prompting => {
                    State::AwaitingCompletion(build_prompt(&current_query, &history, &self.registry))
                }
                State::AwaitingCompletion(prompt) => {
                    completions += 1;
                    debug!(round = completions, backend = self.backend.name(), "awaiting completion");
                    State::Dispatching(self.backend.generate(&prompt).await?)
                }
                State::Dispatching(completion) => match parse_response(&completion) {
                    ParsedResponse::Text { content } => State::Answered(content),
                    ParsedResponse::ToolCall {
                        tool_name: name,
                        tool_args: args,
                    } => {
                        let shown = display_name(&name);
                        history.push(ConversationTurn::assistant(format!(
                            "I need to use the {shown} tool to help answer your question."
                        )));
                        State::InvokingTool { name, args }
                    }
                },
                State::InvokingTool { name, args } => {
                    if let Some(max) = self.options.max_tool_calls.filter(|&max| tool_calls >= max) {
                        warn!(max, "tool call limit reached");
                        return Err(Error::ToolCallLimit(max));
                    }
                    tool_calls += 1;

                    let shown = display_name(&name);
                    observer.on_event(&LoopEvent::ToolCall {
                        name: shown,
                        args: &args,
                    });

                    match self.invoke(&name, &args).await {
                        Ok(content) => {
                            observer.on_event(&LoopEvent::ToolResult {
                                name: shown,
                                content: &content,
                            });
                            State::Recording {
                                turn: ConversationTurn::tool_result(content),
                                next_query: success_follow_up(original_query),
                            }
                        }
                        Err(failure) => {
                            let message = format!("Error calling tool {shown}: {failure}");
                            observer.on_event(&LoopEvent::ToolError {
                                name: shown,
                                message: &message,
                            });
                            State::Recording {
                                turn: ConversationTurn::tool_result(format!("Error: {message}")),
                                next_query: failure_follow_up(&message, original_query),
                            }
                        }
                    }
                }
                State::Recording { turn, next_query } => {
                    history.push(turn);
                    current_query = next_query;
                    State::Prompting
                }
                State::Answered(answer) => {
                    observer.on_event(&LoopEvent::Answer { content: &answer });
                    info!(tool_calls, completions, "query answered");
                    return Ok(Resolution {
                        answer,
                        history,
                        tool_calls,
                        completions,
                    });
                }
            };
        }
    }

    async fn invoke(&self, name: &Value, args: &Value) -> std::result::Result<String, ToolFailure> {
        let name = match name {
            Value::Null => return Err(ToolFailure::MissingName),
            other => tool_name(other).ok_or_else(|| {
                ToolFailure::InvalidInput(format!("tool_name must be a string, got {other}"))
            })?,
        };
        let args = tool_args(args)
            .ok_or_else(|| ToolFailure::InvalidInput("tool_args must be an object".into()))?;
        if !self.registry.contains(name) {
            // Forwarded anyway; the host decides.
            warn!(tool = %name, "tool is not in the registry");
        }
        let output = self.invoker.call_tool(name, &args).await?;
        Ok(output.render())
    }
}

fn display_name(name: &Value) -> &str {
    tool_name(name).unwrap_or("unknown")
}

/// Next query after a tool succeeded.
pub fn success_follow_up(original_query: &str) -> String {
    format!(
        "Based on the tool result above, please provide a comprehensive answer to the user's \
         original question: '{original_query}'. Use the information from the tool result to give \
         a helpful and detailed response."
    )
}

/// Next query after a tool failed.
pub fn failure_follow_up(error_message: &str, original_query: &str) -> String {
    format!(
        "There was an error with the tool call: {error_message}. Please provide a helpful \
         response to the user's original query: '{original_query}'"
    )
}
