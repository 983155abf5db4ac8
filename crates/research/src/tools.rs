//! The research tools, as served over MCP.

use mcp::{CallToolResult, ServerInfo, Tool, ToolCallError, ToolProvider};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

use crate::arxiv::{ArxivClient, PaperSource};
use crate::store::{PaperRecord, PaperStore};

pub const DEFAULT_MAX_RESULTS: usize = 5;
const MAX_RESULTS_LIMIT: usize = 50;

const NO_PAPERS_DIR: &str = "No papers directory found. Please search for papers first.";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    topic: String,
    #[serde(default)]
    max_results: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PaperIdArgs {
    paper_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListArgs {
    #[serde(default)]
    topic: Option<String>,
}

/// Paper search and lookup over a [`PaperSource`] and a [`PaperStore`].
pub struct ResearchTools<S = ArxivClient> {
    source: S,
    store: PaperStore,
}

impl<S: PaperSource> ResearchTools<S> {
    pub fn new(source: S, store: PaperStore) -> Self {
        Self { source, store }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &PaperStore {
        &self.store
    }

    /// Search for papers on `topic` and save them. Returns the ids found.
    pub async fn search_papers(
        &self,
        topic: &str,
        max_results: Option<i64>,
    ) -> Result<Vec<String>, ToolCallError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ToolCallError::InvalidArguments(
                "topic cannot be empty".into(),
            ));
        }
        let max_results = clamp_max_results(max_results);

        let papers = self
            .source
            .search(topic, max_results)
            .await
            .map_err(|e| ToolCallError::Failed(format!("Error searching papers: {e}")))?;
        let report = self
            .store
            .save(topic, &papers)
            .map_err(|e| ToolCallError::Failed(format!("Error saving papers: {e}")))?;

        info!(
            topic,
            found = report.paper_ids.len(),
            new = report.new_papers,
            path = %report.path.display(),
            "search completed"
        );
        Ok(report.paper_ids)
    }

    /// Stored record for `paper_id` as pretty JSON, or a not-found message.
    pub fn extract_info(&self, paper_id: &str) -> Result<String, ToolCallError> {
        match self.lookup(paper_id)? {
            Lookup::Found(record) => serde_json::to_string_pretty(&record)
                .map_err(|e| ToolCallError::Failed(e.to_string())),
            Lookup::Message(message) => Ok(message),
        }
    }

    pub fn list_saved_papers(&self, topic: Option<&str>) -> Result<String, ToolCallError> {
        if !self.store.exists() {
            return Ok(NO_PAPERS_DIR.to_string());
        }
        let topic = topic.map(str::trim).filter(|t| !t.is_empty());
        let papers = self
            .store
            .list(topic)
            .map_err(|e| ToolCallError::Failed(format!("Error listing papers: {e}")))?;

        if papers.is_empty() {
            return Ok(match topic {
                Some(topic) => format!("No saved papers found for topic '{topic}'."),
                None => "No saved papers found.".to_string(),
            });
        }

        serde_json::to_string_pretty(&json!({
            "total_papers": papers.len(),
            "papers": papers,
        }))
        .map_err(|e| ToolCallError::Failed(e.to_string()))
    }

    pub fn get_paper_summary(&self, paper_id: &str) -> Result<String, ToolCallError> {
        match self.lookup(paper_id)? {
            Lookup::Found(record) => Ok(format!(
                "Title: {}\n\nSummary: {}",
                record.title, record.summary
            )),
            Lookup::Message(message) => Ok(message),
        }
    }

    fn lookup(&self, paper_id: &str) -> Result<Lookup, ToolCallError> {
        let paper_id = paper_id.trim();
        if paper_id.is_empty() {
            return Err(ToolCallError::InvalidArguments(
                "paper_id cannot be empty".into(),
            ));
        }
        if !self.store.exists() {
            return Ok(Lookup::Message(NO_PAPERS_DIR.to_string()));
        }

        let record = self
            .store
            .find(paper_id)
            .map_err(|e| ToolCallError::Failed(format!("Error extracting paper info: {e}")))?;
        Ok(match record {
            Some(record) => Lookup::Found(record),
            None => Lookup::Message(format!(
                "No information found for paper ID: {paper_id}. \
                 Please search for papers containing this ID first."
            )),
        })
    }
}

enum Lookup {
    Found(PaperRecord),
    Message(String),
}

fn clamp_max_results(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if (1..=MAX_RESULTS_LIMIT as i64).contains(&n) => n as usize,
        _ => DEFAULT_MAX_RESULTS,
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolCallError> {
    serde_json::from_value(arguments).map_err(|e| ToolCallError::InvalidArguments(e.to_string()))
}

impl<S: PaperSource> ToolProvider for ResearchTools<S> {
    fn info(&self) -> ServerInfo {
        ServerInfo {
            name: "research".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool::new(
                "search_papers",
                "Search for papers on arXiv based on a topic and save their information.",
                json!({
                    "type": "object",
                    "properties": {
                        "topic": {"type": "string", "description": "The research topic to search for"},
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum number of papers to retrieve (default: 5)",
                            "default": DEFAULT_MAX_RESULTS
                        }
                    },
                    "required": ["topic"]
                }),
            ),
            Tool::new(
                "extract_info",
                "Get the saved information for a specific paper ID.",
                json!({
                    "type": "object",
                    "properties": {
                        "paper_id": {"type": "string", "description": "The arXiv paper ID, e.g. 2301.00001"}
                    },
                    "required": ["paper_id"]
                }),
            ),
            Tool::new(
                "list_saved_papers",
                "List all saved papers, optionally filtered by topic.",
                json!({
                    "type": "object",
                    "properties": {
                        "topic": {"type": "string", "description": "Optional topic to filter by"}
                    }
                }),
            ),
            Tool::new(
                "get_paper_summary",
                "Get the title and abstract of a saved paper.",
                json!({
                    "type": "object",
                    "properties": {
                        "paper_id": {"type": "string", "description": "The arXiv paper ID"}
                    },
                    "required": ["paper_id"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolCallError> {
        let text = match name {
            "search_papers" => {
                let args: SearchArgs = parse_args(arguments)?;
                let ids = self.search_papers(&args.topic, args.max_results).await?;
                serde_json::to_string(&ids).map_err(|e| ToolCallError::Failed(e.to_string()))?
            }
            "extract_info" => {
                let args: PaperIdArgs = parse_args(arguments)?;
                self.extract_info(&args.paper_id)?
            }
            "list_saved_papers" => {
                let args: ListArgs = parse_args(arguments)?;
                self.list_saved_papers(args.topic.as_deref())?
            }
            "get_paper_summary" => {
                let args: PaperIdArgs = parse_args(arguments)?;
                self.get_paper_summary(&args.paper_id)?
            }
            other => return Err(ToolCallError::UnknownTool(other.to_string())),
        };
        Ok(CallToolResult::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_results_outside_range_falls_back() {
        assert_eq!(clamp_max_results(None), 5);
        assert_eq!(clamp_max_results(Some(0)), 5);
        assert_eq!(clamp_max_results(Some(-3)), 5);
        assert_eq!(clamp_max_results(Some(51)), 5);
        assert_eq!(clamp_max_results(Some(1)), 1);
        assert_eq!(clamp_max_results(Some(50)), 50);
    }
}
