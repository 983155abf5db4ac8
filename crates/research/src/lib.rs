//! Paper search tools.
//!
//! [`ResearchTools`] searches arXiv through a [`PaperSource`], keeps what it
//! finds in a [`PaperStore`] and serves four tools over MCP:
//! `search_papers`, `extract_info`, `list_saved_papers` and
//! `get_paper_summary`.

pub mod arxiv;
mod error;
pub mod store;
mod tools;

pub use arxiv::{ARXIV_API_URL, ArxivClient, Paper, PaperSource};
pub use error::{Error, Result};
pub use store::{DEFAULT_PAPER_DIR, PaperListing, PaperRecord, PaperStore, SaveReport};
pub use tools::{DEFAULT_MAX_RESULTS, ResearchTools};
