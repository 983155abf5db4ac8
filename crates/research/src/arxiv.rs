//! arXiv search over the public Atom API.

use std::future::Future;

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use reqwest::Url;
use tracing::debug;

use crate::{Error, Result};

pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// A paper as returned by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    /// Short id, e.g. `2401.00001v1`.
    pub id: String,
    pub title: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
    pub authors: Vec<String>,
    pub pdf_url: Option<String>,
    pub doi: Option<String>,
}

/// Something that can find papers on a topic.
pub trait PaperSource: Send + Sync {
    /// Up to `max_results` papers, most relevant first.
    fn search(
        &self,
        topic: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<Paper>>> + Send;
}

pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
    parser: FeedParser,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(ARXIV_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            parser: FeedParser::new()?,
        })
    }

    fn query_url(&self, topic: &str, max_results: usize) -> Result<Url> {
        let query = format!("all:{topic}");
        let max_results = max_results.to_string();
        Url::parse_with_params(
            &self.base_url,
            [
                ("search_query", query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ],
        )
        .map_err(|e| Error::Api(format!("invalid base URL {}: {e}", self.base_url)))
    }
}

impl PaperSource for ArxivClient {
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<Paper>> {
        let url = self.query_url(topic, max_results)?;
        debug!(%url, "querying arXiv");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let mut papers = self.parser.parse(&body);
        papers.truncate(max_results);
        Ok(papers)
    }
}

/// Pulls entries out of an Atom feed.
///
/// arXiv feeds are flat and machine-generated, so a handful of patterns is
/// enough.
struct FeedParser {
    entry: Regex,
    id: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    author: Regex,
    link: Regex,
    href: Regex,
    doi: Regex,
    whitespace: Regex,
    char_ref: Regex,
}

impl FeedParser {
    fn new() -> Result<Self> {
        let re = |pattern: &str| Regex::new(pattern).map_err(|e| Error::Parse(e.to_string()));
        Ok(Self {
            entry: re(r"(?s)<entry\b[^>]*>(.*?)</entry>")?,
            id: re(r"(?s)<id>(.*?)</id>")?,
            title: re(r"(?s)<title\b[^>]*>(.*?)</title>")?,
            summary: re(r"(?s)<summary\b[^>]*>(.*?)</summary>")?,
            published: re(r"(?s)<published>(.*?)</published>")?,
            author: re(r"(?s)<author>\s*<name>(.*?)</name>")?,
            link: re(r"<link\b[^>]*>")?,
            href: re(r#"href="([^"]*)""#)?,
            doi: re(r"(?s)<arxiv:doi\b[^>]*>(.*?)</arxiv:doi>")?,
            whitespace: re(r"\s+")?,
            char_ref: re(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));")?,
        })
    }

    fn parse(&self, feed: &str) -> Vec<Paper> {
        self.entry
            .captures_iter(feed)
            .filter_map(|c| self.parse_entry(c.get(1)?.as_str()))
            .collect()
    }

    fn parse_entry(&self, entry: &str) -> Option<Paper> {
        let entry_id = capture(&self.id, entry)?;
        let id = entry_id.rsplit('/').next()?.trim().to_string();
        if id.is_empty() {
            return None;
        }

        let title = capture(&self.title, entry).unwrap_or_default();
        let title = self.whitespace.replace_all(title.trim(), " ").into_owned();

        let published = capture(&self.published, entry)
            .and_then(|p| DateTime::parse_from_rfc3339(p.trim()).ok())
            .map(|p| p.with_timezone(&Utc));

        let authors = self
            .author
            .captures_iter(entry)
            .filter_map(|c| c.get(1))
            .map(|m| self.unescape(m.as_str().trim()))
            .collect();

        let pdf_url = self
            .link
            .find_iter(entry)
            .map(|m| m.as_str())
            .find(|tag| tag.contains(r#"title="pdf""#))
            .and_then(|tag| capture(&self.href, tag))
            .map(|href| self.unescape(&href));

        Some(Paper {
            id,
            title: self.unescape(&title),
            summary: self.unescape(capture(&self.summary, entry).unwrap_or_default().trim()),
            published,
            authors,
            pdf_url,
            doi: capture(&self.doi, entry).map(|d| self.unescape(d.trim())),
        })
    }

    /// Resolve numeric character references, then the predefined XML entities.
    /// References that name no valid character are left as written.
    fn unescape(&self, text: &str) -> String {
        let text = self.char_ref.replace_all(text, |caps: &Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse().ok(),
                (None, None) => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        });
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
