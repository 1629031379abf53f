//! Watch history data model and the resolve / extract / merge / persist stages
//! that turn a history page into the local dataset.

pub mod extractor;
pub mod identity;
pub mod merge;
pub mod store;

// Re-export main types
pub use extractor::HistoryExtractor;
pub use identity::{absolutize_url, resolve_video_id, BASE_ORIGIN};
pub use merge::{merge_history, MergeOutcome, SubtitleLookup};
pub use store::{HistoryStats, HistoryStore};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single persisted watch history entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    /// Canonical video identifier, unique across the store
    pub video_id: String,
    /// Title as shown on the history page (may be empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// URL as observed on the page (watch or Shorts form)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    /// Intercepted subtitle payload, kept opaque
    #[serde(default)]
    pub subtitle: Option<Value>,
}

impl HistoryRecord {
    pub fn new(video_id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            url: url.into(),
            subtitle: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: Option<Value>) -> Self {
        self.subtitle = subtitle;
        self
    }

    /// Whether the observed URL is a Shorts link
    pub fn is_short(&self) -> bool {
        self.url.contains(identity::SHORTS_MARKER)
    }
}

/// Unresolved `{title, url}` pair read off the history page, newest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: String,
    pub url: String,
}

impl RawCandidate {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_accepts_null_title() {
        let record: HistoryRecord = serde_json::from_value(json!({
            "video_id": "abc",
            "title": null,
            "url": "https://www.youtube.com/watch?v=abc",
        }))
        .unwrap();

        assert_eq!(record.title, "");
        assert!(record.subtitle.is_none());
    }

    #[test]
    fn test_record_serializes_null_subtitle() {
        let record = HistoryRecord::new("abc", "Title", "https://www.youtube.com/watch?v=abc");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["subtitle"], Value::Null);
        assert_eq!(value["video_id"], "abc");
    }

    #[test]
    fn test_is_short() {
        let short = HistoryRecord::new("XYZ123", "", "https://www.youtube.com/shorts/XYZ123");
        let watch = HistoryRecord::new("abc", "", "https://www.youtube.com/watch?v=abc");

        assert!(short.is_short());
        assert!(!watch.is_short());
    }
}
