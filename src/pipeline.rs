//! One scrape run: page interaction and subtitle interception run concurrently and
//! meet only through the run's [`SubtitleSink`]; the merge sees a single snapshot of
//! it taken after the page has been read.

use crate::capture::{scroll_to_load_more, HistoryPage};
use crate::config::Config;
use crate::history::{merge_history, HistoryExtractor, HistoryStore, RawCandidate};
use crate::subtitles::{InterceptStats, InterceptedResponse, SubtitleInterceptor, SubtitleSink};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Outcome of a scrape run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Records added to the dataset
    pub added: usize,
    /// Added records that carry subtitles
    pub subtitle_hits: usize,
    /// Subtitle payloads captured when the merge took its snapshot
    pub subtitles_captured: usize,
    /// Records in the dataset after the run
    pub total: usize,
    /// Whether the dataset file was rewritten
    pub updated: bool,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.updated {
            write!(
                f,
                "{} added, {} subtitle hits, total now {}",
                self.added, self.subtitle_hits, self.total
            )
        } else {
            write!(f, "no update, {} total records unchanged", self.total)
        }
    }
}

/// Drives a scrape run against a configured dataset
pub struct ScrapeRun {
    config: Config,
    store: HistoryStore,
    extractor: HistoryExtractor,
}

impl ScrapeRun {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let store = HistoryStore::new(config.storage.output_path.clone());
        let extractor = HistoryExtractor::new()?;

        Ok(Self {
            config,
            store,
            extractor,
        })
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Channel sized for this run's interception stream
    pub fn interception_channel(
        &self,
    ) -> (mpsc::Sender<InterceptedResponse>, mpsc::Receiver<InterceptedResponse>) {
        mpsc::channel(self.config.interception.channel_capacity)
    }

    /// Scroll and read `page` while `events` is drained into a fresh subtitle sink,
    /// then merge into the dataset and persist if anything new was found.
    pub async fn execute<P>(
        &self,
        page: &mut P,
        events: mpsc::Receiver<InterceptedResponse>,
    ) -> Result<RunReport>
    where
        P: HistoryPage + ?Sized,
    {
        info!("🚀 Starting scrape run");

        let sink = SubtitleSink::new();
        let interceptor =
            SubtitleInterceptor::with_marker(sink.clone(), self.config.interception.endpoint_marker.clone());
        let mut interception = interceptor.spawn(events);

        let candidates = match self.read_page(page).await {
            Ok(candidates) => candidates,
            Err(e) => {
                interception.abort();
                return Err(e);
            }
        };

        self.await_interception(&mut interception).await;
        let subtitles = sink.snapshot().await;
        interception.abort();

        let existing = self.store.load().await;
        info!("📦 Dataset currently holds {} records", existing.len());

        let outcome = merge_history(&candidates, existing, &subtitles);
        let mut report = RunReport {
            added: outcome.added,
            subtitle_hits: outcome.subtitle_hits,
            subtitles_captured: subtitles.len(),
            total: outcome.total(),
            updated: false,
        };

        if !outcome.has_updates() {
            info!("✨ Scrape finished: {}", report);
            return Ok(report);
        }

        self.store.save(&outcome.records).await.with_context(|| {
            format!(
                "{} new records were merged but NOT saved to {}",
                outcome.added,
                self.store.path().display()
            )
        })?;
        report.updated = true;

        info!("🎉 Scrape finished: {}", report);
        Ok(report)
    }

    async fn read_page<P>(&self, page: &mut P) -> Result<Vec<RawCandidate>>
    where
        P: HistoryPage + ?Sized,
    {
        scroll_to_load_more(page, self.config.scrape.max_scrolls, self.config.scrape.scroll_settle())
            .await
            .context("Failed to load older history")?;

        let html = page.content().await.context("Failed to read history page")?;
        Ok(self.extractor.extract(&html))
    }

    /// Give in-flight interceptions up to the grace period to land
    async fn await_interception(&self, interception: &mut JoinHandle<InterceptStats>) {
        let grace = self.config.interception.grace_period();
        match tokio::time::timeout(grace, interception).await {
            Ok(Ok(stats)) => info!(
                "📝 Interception complete: {} stored, {} dropped",
                stats.stored, stats.dropped
            ),
            Ok(Err(e)) => warn!("Interception task failed: {}", e),
            Err(_) => warn!(
                "Interception still running after {}ms, merging with subtitles captured so far",
                grace.as_millis()
            ),
        }
    }
}
