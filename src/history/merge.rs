//! Incremental merge of freshly observed history into the persisted dataset.
//!
//! Candidates arrive newest first. Anything whose id is already known (persisted, or
//! emitted earlier in the same run) is skipped and scanning continues, so a new item
//! that shows up after a known one because of feed jitter is still captured. New
//! records keep their candidate order and are placed ahead of every existing record.

use super::identity::resolve_video_id;
use super::{HistoryRecord, RawCandidate};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Read access to intercepted subtitle payloads, keyed by video id
pub trait SubtitleLookup {
    fn subtitle_for(&self, video_id: &str) -> Option<Value>;
}

impl SubtitleLookup for HashMap<String, Value> {
    fn subtitle_for(&self, video_id: &str) -> Option<Value> {
        self.get(video_id).cloned()
    }
}

/// Result of merging one run's candidates into the existing records
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// New records followed by the untouched existing records
    pub records: Vec<HistoryRecord>,
    /// Number of records added in this merge
    pub added: usize,
    /// New records that carry a subtitle payload
    pub subtitle_hits: usize,
    /// Candidates whose URL did not resolve to a video id
    pub unresolved: usize,
    /// Candidates skipped because their id was already known
    pub duplicates: usize,
}

impl MergeOutcome {
    /// Whether the store needs to be rewritten
    pub fn has_updates(&self) -> bool {
        self.added > 0
    }

    /// Total record count after the merge
    pub fn total(&self) -> usize {
        self.records.len()
    }
}

/// Ids present in a record list
pub fn known_video_ids(records: &[HistoryRecord]) -> HashSet<String> {
    records.iter().map(|record| record.video_id.clone()).collect()
}

/// Merge candidates (newest first) into `existing`, attaching any subtitles found in
/// `subtitles` at lookup time.
pub fn merge_history<S>(
    candidates: &[RawCandidate],
    existing: Vec<HistoryRecord>,
    subtitles: &S,
) -> MergeOutcome
where
    S: SubtitleLookup + ?Sized,
{
    let mut seen = known_video_ids(&existing);
    let mut new_records = Vec::new();
    let mut outcome = MergeOutcome::default();

    for candidate in candidates {
        let Some(video_id) = resolve_video_id(&candidate.url) else {
            warn!("Dropping '{}': no video id in URL {:?}", candidate.title, candidate.url);
            outcome.unresolved += 1;
            continue;
        };

        if seen.contains(&video_id) {
            outcome.duplicates += 1;
            continue;
        }

        let subtitle = subtitles.subtitle_for(&video_id);
        if subtitle.is_some() {
            outcome.subtitle_hits += 1;
        }

        new_records.push(
            HistoryRecord::new(video_id.clone(), candidate.title.clone(), candidate.url.clone())
                .with_subtitle(subtitle),
        );
        seen.insert(video_id);
    }

    outcome.added = new_records.len();
    new_records.extend(existing);
    outcome.records = new_records;

    if outcome.has_updates() {
        info!(
            "🧩 Merged {} new records ({} with subtitles), {} total",
            outcome.added,
            outcome.subtitle_hits,
            outcome.total()
        );
    } else {
        debug!(
            "No new records: {} duplicates, {} unresolved",
            outcome.duplicates, outcome.unresolved
        );
    }

    outcome
}
