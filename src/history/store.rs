//! JSON-file persistence for the history dataset.
//!
//! Loading never fails: a missing file is an empty store and a corrupt one is
//! reported and treated as empty. Saving always replaces the whole file through a
//! temporary sibling that is renamed over the destination, so an interrupted run
//! leaves the previous file intact. One writer per path is assumed; concurrent runs
//! against the same store are not supported.

use super::HistoryRecord;
use crate::{HistoryError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Summary counts for a stored dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub with_subtitles: usize,
    pub shorts: usize,
}

impl HistoryStats {
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        Self {
            total: records.len(),
            with_subtitles: records.iter().filter(|r| r.subtitle.is_some()).count(),
            shorts: records.iter().filter(|r| r.is_short()).count(),
        }
    }
}

/// Handle to the dataset file at a fixed path
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted records, newest first
    pub async fn load(&self) -> Vec<HistoryRecord> {
        if !self.path.exists() {
            debug!("No existing dataset at {}", self.path.display());
            return Vec::new();
        }

        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let records = parse_records(&content, &self.path);
                info!("📦 Loaded {} records from {}", records.len(), self.path.display());
                records
            }
            Err(e) => {
                warn!(
                    "Failed to read {}: {}, starting from an empty dataset",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Replace the dataset with `records`
    pub async fn save(&self, records: &[HistoryRecord]) -> Result<()> {
        let content = serde_json::to_vec_pretty(records)?;
        let path = self.path.clone();
        let count = records.len();

        tokio::task::spawn_blocking(move || write_atomically(&path, &content))
            .await
            .map_err(|e| HistoryError::Persist {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })??;

        info!("💾 Saved {} records to {}", count, self.path.display());
        Ok(())
    }

    pub async fn stats(&self) -> HistoryStats {
        HistoryStats::from_records(&self.load().await)
    }
}

/// Decode a dataset file, dropping entries that cannot be used as records.
///
/// Anything other than a JSON array yields an empty list. Entries without a
/// non-empty `video_id`, and repeats of an id already seen, are skipped.
pub fn parse_records(content: &str, source: &Path) -> Vec<HistoryRecord> {
    let entries = match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            warn!(
                "{} is not a JSON list, starting from an empty dataset",
                source.display()
            );
            return Vec::new();
        }
        Err(e) => {
            warn!(
                "Failed to parse {}: {}, starting from an empty dataset",
                source.display(),
                e
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let record = match serde_json::from_value::<HistoryRecord>(entry) {
            Ok(record) if !record.video_id.is_empty() => record,
            Ok(_) => {
                warn!("Skipping entry {} in {}: empty video_id", index, source.display());
                continue;
            }
            Err(e) => {
                warn!("Skipping entry {} in {}: {}", index, source.display(), e);
                continue;
            }
        };

        if !seen.insert(record.video_id.clone()) {
            warn!(
                "Skipping entry {} in {}: duplicate video_id {}",
                index,
                source.display(),
                record.video_id
            );
            continue;
        }

        records.push(record);
    }

    records
}

fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let persist_err = |source: std::io::Error| HistoryError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(persist_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    tmp.write_all(content).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(path).map_err(|e| persist_err(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(id: &str) -> HistoryRecord {
        HistoryRecord::new(id, format!("Title {}", id), format!("https://www.youtube.com/watch?v={}", id))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("missing.json"));

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        assert!(HistoryStore::new(&path).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_list_json_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        tokio::fs::write(&path, r#"{"video_id": "A"}"#).await.unwrap();

        assert!(HistoryStore::new(&path).load().await.is_empty());
    }

    #[test]
    fn test_parse_skips_unusable_entries() {
        let content = json!([
            {"video_id": "A", "title": "First", "url": "u", "subtitle": null},
            {"video_id": null, "title": "No id"},
            {"title": "Missing id"},
            {"video_id": ""},
            "not an object",
            {"video_id": "A", "title": "Later duplicate"},
            {"video_id": "B"}
        ])
        .to_string();

        let records = parse_records(&content, Path::new("history.json"));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "First");
        assert_eq!(records[1].video_id, "B");
        assert_eq!(records[1].title, "");
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_round_trips_unicode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("output").join("history.json");
        let store = HistoryStore::new(&path);

        let records = vec![
            HistoryRecord::new("A", "日本語 ✨ Ελληνικά", "https://www.youtube.com/watch?v=A")
                .with_subtitle(Some(json!({"events": []}))),
            record("B"),
        ];
        store.save(&records).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains("日本語 ✨ Ελληνικά"));
        assert_eq!(store.load().await, records);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("history.json"));

        store.save(&[record("A"), record("B"), record("C")]).await.unwrap();
        store.save(&[record("D")]).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded, vec![record("D")]);

        // No temporary files left behind
        let leftovers = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        tokio::fs::write(&blocker, "file").await.unwrap();

        let store = HistoryStore::new(blocker.join("history.json"));
        let err = store.save(&[record("A")]).await.unwrap_err();

        assert!(matches!(err, HistoryError::Persist { .. }));
    }

    #[tokio::test]
    async fn test_stats() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("history.json"));
        store
            .save(&[
                record("A").with_subtitle(Some(json!({}))),
                HistoryRecord::new("S", "short", "https://www.youtube.com/shorts/S"),
            ])
            .await
            .unwrap();

        assert_eq!(
            store.stats().await,
            HistoryStats { total: 2, with_subtitles: 1, shorts: 1 }
        );
    }
}
