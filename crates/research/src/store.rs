//! On-disk paper store.
//!
//! Papers are grouped by the topic they were found under:
//!
//! ```text
//! papers/
//!   diffusion_models/papers_info.json
//!   llm_agents/papers_info.json
//! ```
//!
//! Each file maps a paper id to its [`PaperRecord`].

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;
use crate::arxiv::Paper;

/// Directory used when none is configured.
pub const DEFAULT_PAPER_DIR: &str = "papers";

const INFO_FILE: &str = "papers_info.json";

/// Everything kept about one saved paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperRecord {
    pub title: String,
    pub summary: String,
    pub published: Option<String>,
    pub authors: Vec<String>,
    pub pdf_url: Option<String>,
    pub doi: Option<String>,
    pub topic_searched: String,
    pub arxiv_url: String,
}

impl PaperRecord {
    fn from_paper(paper: &Paper, topic: &str) -> Self {
        Self {
            title: paper.title.trim().to_string(),
            summary: paper.summary.trim().to_string(),
            published: paper.published.map(|p| p.to_rfc3339()),
            authors: paper.authors.clone(),
            pdf_url: paper.pdf_url.clone(),
            doi: paper.doi.clone(),
            topic_searched: topic.to_string(),
            arxiv_url: format!("https://arxiv.org/abs/{}", paper.id),
        }
    }
}

/// Short form of a record, as returned by [`PaperStore::list`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperListing {
    pub title: String,
    pub authors: Vec<String>,
    pub published: Option<String>,
    pub topic_searched: String,
    pub arxiv_url: String,
}

/// Outcome of [`PaperStore::save`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    /// Ids of every paper passed in, in order, whether new or not.
    pub paper_ids: Vec<String>,
    /// How many of them were not stored before.
    pub new_papers: usize,
    pub path: PathBuf,
}

type PaperMap = BTreeMap<String, PaperRecord>;

/// Directory name a topic is stored under.
pub fn topic_dir_name(topic: &str) -> String {
    topic.to_lowercase().replace([' ', '/'], "_")
}

#[derive(Debug, Clone)]
pub struct PaperStore {
    root: PathBuf,
}

impl Default for PaperStore {
    fn default() -> Self {
        Self::new(DEFAULT_PAPER_DIR)
    }
}

impl PaperStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether anything has ever been saved here.
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Path of the info file for `topic`.
    pub fn topic_file(&self, topic: &str) -> PathBuf {
        self.root.join(topic_dir_name(topic)).join(INFO_FILE)
    }

    /// Store `papers` under `topic`. Ids already present are left untouched.
    pub fn save(&self, topic: &str, papers: &[Paper]) -> Result<SaveReport> {
        let path = self.topic_file(topic);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut existing = match read_map(&path) {
            Ok(map) => map,
            Err(ReadError::Missing) => PaperMap::new(),
            Err(ReadError::Corrupt(e)) => {
                warn!(path = %path.display(), "corrupt paper file, starting over: {e}");
                PaperMap::new()
            }
            Err(ReadError::Io(e)) => return Err(e.into()),
        };

        let mut paper_ids = Vec::with_capacity(papers.len());
        let mut new_papers = 0;
        for paper in papers {
            paper_ids.push(paper.id.clone());
            if existing.contains_key(&paper.id) {
                continue;
            }
            existing.insert(paper.id.clone(), PaperRecord::from_paper(paper, topic));
            new_papers += 1;
        }

        fs::write(&path, serde_json::to_string_pretty(&existing)?)?;
        debug!(path = %path.display(), total = existing.len(), new_papers, "papers saved");

        Ok(SaveReport {
            paper_ids,
            new_papers,
            path,
        })
    }

    /// Look a paper up across every topic.
    pub fn find(&self, paper_id: &str) -> Result<Option<PaperRecord>> {
        for (_, path) in self.topic_files()? {
            match read_map(&path) {
                Ok(mut map) => {
                    if let Some(record) = map.remove(paper_id) {
                        return Ok(Some(record));
                    }
                }
                Err(ReadError::Missing) => {}
                Err(e) => warn!(path = %path.display(), "skipping unreadable paper file: {e}"),
            }
        }
        Ok(None)
    }

    /// Every saved paper, optionally restricted to one topic.
    pub fn list(&self, topic: Option<&str>) -> Result<BTreeMap<String, PaperListing>> {
        let wanted = topic.map(topic_dir_name);
        let mut listings = BTreeMap::new();

        for (dir_name, path) in self.topic_files()? {
            if wanted
                .as_deref()
                .is_some_and(|w| !w.eq_ignore_ascii_case(&dir_name))
            {
                continue;
            }
            let map = match read_map(&path) {
                Ok(map) => map,
                Err(ReadError::Missing) => continue,
                Err(e) => {
                    warn!(path = %path.display(), "skipping unreadable paper file: {e}");
                    continue;
                }
            };
            for (id, record) in map {
                let topic_searched = if record.topic_searched.is_empty() {
                    dir_name.replace('_', " ")
                } else {
                    record.topic_searched
                };
                let arxiv_url = if record.arxiv_url.is_empty() {
                    format!("https://arxiv.org/abs/{id}")
                } else {
                    record.arxiv_url
                };
                listings.insert(
                    id,
                    PaperListing {
                        title: record.title,
                        authors: record.authors,
                        published: record.published,
                        topic_searched,
                        arxiv_url,
                    },
                );
            }
        }

        Ok(listings)
    }

    /// `(directory name, info file)` for every topic directory, sorted.
    fn topic_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push((name, entry.path().join(INFO_FILE)));
        }
        files.sort();
        Ok(files)
    }
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error("file does not exist")]
    Missing,
    #[error("{0}")]
    Corrupt(serde_json::Error),
    #[error("{0}")]
    Io(std::io::Error),
}

fn read_map(path: &Path) -> std::result::Result<PaperMap, ReadError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ReadError::Missing),
        Err(e) => return Err(ReadError::Io(e)),
    };
    serde_json::from_str(&raw).map_err(ReadError::Corrupt)
}
