//! AssetRef Search - reference finder for Unity projects
//!
//! This crate is organized into:
//! - types: Core data structures (SearchRequest, SearchResult, EntityRef)
//! - error: Search error taxonomy
//! - backend: External search tools (grep / findstr) run as subprocesses
//! - parser: `path:line:content` output parsing
//! - resolver: Mapping hit paths to tracked assets
//! - orchestrator: Fan-out, join and result aggregation
//! - history: Bounded log of past searches

pub mod backend;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod parser;
pub mod resolver;
pub mod types;

// Re-export public types
pub use backend::{ProcessBackend, SearchBackend, SearchTool};
pub use error::SearchError;
pub use history::{HistoryEntry, SearchHistory};
pub use orchestrator::Orchestrator;
pub use resolver::{AssetIndex, EntityResolver, MapResolver};
pub use types::{EntityRef, Invocation, SearchRequest, SearchResult, MAX_RESULTS, MIN_SEARCH_LEN};

pub use tokio_util::sync::CancellationToken;
