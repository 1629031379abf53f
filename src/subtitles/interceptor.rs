//! Classifies intercepted network responses and stores subtitle payloads
use super::SubtitleSink;
use crate::history::identity::{parse_with_base, query_param};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// URL fragment identifying the subtitle endpoint
pub const SUBTITLE_ENDPOINT_MARKER: &str = "timedtext";

/// A network response observed while the history page was loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedResponse {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub body: String,
}

/// What happened to a single intercepted response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// Not a successful subtitle response
    Ignored,
    /// Payload stored for this video id
    Stored(String),
    /// Subtitle response whose payload could not be used
    Dropped,
}

/// Counters reported when the interception stream ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterceptStats {
    pub stored: usize,
    pub dropped: usize,
    pub ignored: usize,
}

impl InterceptStats {
    fn record(&mut self, outcome: &InterceptOutcome) {
        match outcome {
            InterceptOutcome::Ignored => self.ignored += 1,
            InterceptOutcome::Stored(_) => self.stored += 1,
            InterceptOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// Feeds subtitle responses into a [`SubtitleSink`]
#[derive(Debug, Clone)]
pub struct SubtitleInterceptor {
    sink: SubtitleSink,
    endpoint_marker: String,
}

impl SubtitleInterceptor {
    pub fn new(sink: SubtitleSink) -> Self {
        Self::with_marker(sink, SUBTITLE_ENDPOINT_MARKER)
    }

    pub fn with_marker(sink: SubtitleSink, endpoint_marker: impl Into<String>) -> Self {
        Self {
            sink,
            endpoint_marker: endpoint_marker.into(),
        }
    }

    pub fn sink(&self) -> &SubtitleSink {
        &self.sink
    }

    /// Handle one response. Failures are isolated to that response.
    pub async fn handle_response(&self, response: &InterceptedResponse) -> InterceptOutcome {
        if !response.url.contains(&self.endpoint_marker)
            || !response.method.eq_ignore_ascii_case("GET")
        {
            return InterceptOutcome::Ignored;
        }

        if response.status != 200 {
            warn!("Ignoring subtitle response with status {}: {}", response.status, response.url);
            return InterceptOutcome::Ignored;
        }

        let payload = match serde_json::from_str::<Value>(&response.body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to parse subtitle payload from {}: {}", response.url, e);
                return InterceptOutcome::Dropped;
            }
        };

        let Some(video_id) = parse_with_base(&response.url).and_then(|url| query_param(&url, "v")) else {
            warn!("Ignoring subtitle response without a video id: {}", response.url);
            return InterceptOutcome::Ignored;
        };

        self.sink.put(video_id.clone(), payload).await;
        info!("📝 Captured subtitles for video {}", video_id);
        InterceptOutcome::Stored(video_id)
    }

    /// Run the interceptor as its own task until the sending side closes
    pub fn spawn(self, mut events: mpsc::Receiver<InterceptedResponse>) -> JoinHandle<InterceptStats> {
        tokio::spawn(async move {
            let mut stats = InterceptStats::default();
            while let Some(response) = events.recv().await {
                let outcome = self.handle_response(&response).await;
                stats.record(&outcome);
            }
            debug!(
                "Interception stream closed: {} stored, {} dropped, {} ignored",
                stats.stored, stats.dropped, stats.ignored
            );
            stats
        })
    }
}
