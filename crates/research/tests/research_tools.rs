//! The research tools driven through the MCP provider interface.

use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use mcp::{CallToolResult, ToolCallError, ToolProvider};
use research::{Error, Paper, PaperSource, PaperStore, ResearchTools};
use serde_json::{Value, json};
use tempfile::TempDir;

#[derive(Default)]
struct FakeSource {
    papers: Vec<Paper>,
    fail: bool,
    requests: Mutex<Vec<(String, usize)>>,
}

impl PaperSource for FakeSource {
    async fn search(&self, topic: &str, max_results: usize) -> research::Result<Vec<Paper>> {
        self.requests
            .lock()
            .unwrap()
            .push((topic.to_string(), max_results));
        if self.fail {
            return Err(Error::Network("connection refused".into()));
        }
        Ok(self.papers.iter().take(max_results).cloned().collect())
    }
}

fn paper(id: &str, title: &str) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        summary: format!("Abstract of {title}."),
        published: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
        authors: vec!["Grace Hopper".to_string()],
        pdf_url: None,
        doi: None,
    }
}

fn tools(dir: &TempDir, source: FakeSource) -> ResearchTools<FakeSource> {
    ResearchTools::new(source, PaperStore::new(dir.path().join("papers")))
}

fn text(result: CallToolResult) -> String {
    assert!(!result.is_error);
    result.joined_text()
}

#[test]
fn advertises_four_tools() {
    let dir = TempDir::new().unwrap();
    let tools = tools(&dir, FakeSource::default());
    let names: Vec<_> = ToolProvider::tools(&tools).into_iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec!["search_papers", "extract_info", "list_saved_papers", "get_paper_summary"]
    );
    assert_eq!(tools.info().name, "research");
}

#[tokio::test]
async fn search_then_look_up() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource {
        papers: vec![paper("2401.00001v1", "Diffusion Beats GANs"), paper("2401.00002v1", "Score Matching")],
        ..Default::default()
    };
    let tools = tools(&dir, source);

    let ids = text(
        tools
            .call("search_papers", json!({"topic": "diffusion models", "max_results": 2}))
            .await
            .unwrap(),
    );
    let ids: Vec<String> = serde_json::from_str(&ids).unwrap();
    assert_eq!(ids, vec!["2401.00001v1", "2401.00002v1"]);

    let info = text(
        tools
            .call("extract_info", json!({"paper_id": " 2401.00002v1 "}))
            .await
            .unwrap(),
    );
    let info: Value = serde_json::from_str(&info).unwrap();
    assert_eq!(info["title"], "Score Matching");
    assert_eq!(info["topic_searched"], "diffusion models");

    let summary = text(
        tools
            .call("get_paper_summary", json!({"paper_id": "2401.00001v1"}))
            .await
            .unwrap(),
    );
    assert_eq!(
        summary,
        "Title: Diffusion Beats GANs\n\nSummary: Abstract of Diffusion Beats GANs."
    );

    let listing = text(tools.call("list_saved_papers", json!({})).await.unwrap());
    let listing: Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(listing["total_papers"], 2);
    assert_eq!(
        listing["papers"]["2401.00001v1"]["arxiv_url"],
        "https://arxiv.org/abs/2401.00001v1"
    );
}

#[tokio::test]
async fn out_of_range_max_results_uses_default() {
    let dir = TempDir::new().unwrap();
    let tools = tools(&dir, FakeSource::default());

    tools
        .call("search_papers", json!({"topic": "x", "max_results": 500}))
        .await
        .unwrap();
    tools.call("search_papers", json!({"topic": "x"})).await.unwrap();

    let requests = tools.source().requests.lock().unwrap().clone();
    assert_eq!(requests, vec![("x".to_string(), 5), ("x".to_string(), 5)]);
}

#[tokio::test]
async fn empty_topic_is_rejected() {
    let dir = TempDir::new().unwrap();
    let tools = tools(&dir, FakeSource::default());
    let err = tools
        .call("search_papers", json!({"topic": "   "}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolCallError::InvalidArguments(_)));
}

#[tokio::test]
async fn source_failure_is_a_tool_failure() {
    let dir = TempDir::new().unwrap();
    let tools = tools(
        &dir,
        FakeSource {
            fail: true,
            ..Default::default()
        },
    );
    let err = tools
        .call("search_papers", json!({"topic": "llm agents"}))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error searching papers: network error: connection refused"
    );
}

#[tokio::test]
async fn lookups_before_any_search() {
    let dir = TempDir::new().unwrap();
    let tools = tools(&dir, FakeSource::default());

    for (name, args) in [
        ("extract_info", json!({"paper_id": "1234.5678"})),
        ("get_paper_summary", json!({"paper_id": "1234.5678"})),
        ("list_saved_papers", json!({})),
    ] {
        let message = text(tools.call(name, args).await.unwrap());
        assert_eq!(message, "No papers directory found. Please search for papers first.");
    }
}

#[tokio::test]
async fn unknown_ids_and_topics_are_plain_messages() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource {
        papers: vec![paper("a", "A")],
        ..Default::default()
    };
    let tools = tools(&dir, source);
    tools.call("search_papers", json!({"topic": "t"})).await.unwrap();

    let missing = text(tools.call("extract_info", json!({"paper_id": "zzz"})).await.unwrap());
    assert!(missing.starts_with("No information found for paper ID: zzz."));

    let none = text(
        tools
            .call("list_saved_papers", json!({"topic": "quantum"}))
            .await
            .unwrap(),
    );
    assert_eq!(none, "No saved papers found for topic 'quantum'.");
}

#[tokio::test]
async fn bad_arguments_and_unknown_tools() {
    let dir = TempDir::new().unwrap();
    let tools = tools(&dir, FakeSource::default());

    assert!(matches!(
        tools.call("extract_info", json!({})).await,
        Err(ToolCallError::InvalidArguments(_))
    ));
    assert!(matches!(
        tools.call("summon", json!({})).await,
        Err(ToolCallError::UnknownTool(name)) if name == "summon"
    ));
}
