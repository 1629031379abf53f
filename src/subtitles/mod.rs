//! Subtitle capture for a single scrape run.
//!
//! The sink is created empty per run, shared between the interception task and the
//! merge step, and dropped when the run ends.

pub mod interceptor;

pub use interceptor::{InterceptStats, InterceptedResponse, SubtitleInterceptor};

use crate::history::SubtitleLookup;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Video id → most recently intercepted subtitle payload
#[derive(Debug, Clone, Default)]
pub struct SubtitleSink {
    payloads: Arc<RwLock<HashMap<String, Value>>>,
}

impl SubtitleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload, replacing any earlier one for the same id.
    /// Returns the replaced payload.
    pub async fn put(&self, video_id: impl Into<String>, payload: Value) -> Option<Value> {
        self.payloads.write().await.insert(video_id.into(), payload)
    }

    pub async fn get(&self, video_id: &str) -> Option<Value> {
        self.payloads.read().await.get(video_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.payloads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.payloads.read().await.is_empty()
    }

    /// Copy of the current contents; later writes are not reflected in it
    pub async fn snapshot(&self) -> SubtitleSnapshot {
        SubtitleSnapshot {
            payloads: self.payloads.read().await.clone(),
        }
    }
}

/// Point-in-time view of a [`SubtitleSink`] used by the merge step
#[derive(Debug, Clone, Default)]
pub struct SubtitleSnapshot {
    payloads: HashMap<String, Value>,
}

impl SubtitleSnapshot {
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

impl SubtitleLookup for SubtitleSnapshot {
    fn subtitle_for(&self, video_id: &str) -> Option<Value> {
        self.payloads.get(video_id).cloned()
    }
}
