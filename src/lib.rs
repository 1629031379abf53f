//! YouTube watch history scraper
//!
//! Keeps a deduplicated, newest-first JSON dataset of the videos (and Shorts) in a
//! user's watch history, attaching subtitle payloads intercepted while the history
//! page was loading.

use std::path::PathBuf;

pub mod capture;
pub mod config;
pub mod history;
pub mod pipeline;
pub mod session;
pub mod subtitles;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for easy access
pub use crate::capture::{HistoryPage, SnapshotPage};
pub use crate::config::Config;
pub use crate::history::merge::{merge_history, MergeOutcome, SubtitleLookup};
pub use crate::history::store::{HistoryStats, HistoryStore};
pub use crate::history::{resolve_video_id, HistoryExtractor, HistoryRecord, RawCandidate};
pub use crate::pipeline::{RunReport, ScrapeRun};
pub use crate::subtitles::{InterceptedResponse, SubtitleInterceptor, SubtitleSink, SubtitleSnapshot};

/// Result type for library operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Error types for library operations
#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
