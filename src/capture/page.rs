//! History page interaction
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// A loaded history page that can be scrolled to reveal older entries
#[async_trait]
pub trait HistoryPage: Send {
    /// Scroll to the bottom so the feed loads its next batch
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Current rendered HTML of the page
    async fn content(&mut self) -> Result<String>;
}

/// Scroll the page `max_scrolls` times, waiting `settle` after each scroll for new
/// content to render
pub async fn scroll_to_load_more<P>(page: &mut P, max_scrolls: u32, settle: Duration) -> Result<()>
where
    P: HistoryPage + ?Sized,
{
    info!("📜 Scrolling history page {} times", max_scrolls);

    for i in 0..max_scrolls {
        page.scroll_to_bottom().await?;
        tokio::time::sleep(settle).await;
        info!("📜 Finished scroll {}/{}", i + 1, max_scrolls);
    }

    Ok(())
}

/// History page backed by saved HTML snapshots.
///
/// Each snapshot is the page as it looked after one more scroll; scrolling past the
/// last snapshot keeps showing it.
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    snapshots: Vec<PathBuf>,
    position: usize,
}

impl SnapshotPage {
    pub fn new(snapshots: Vec<PathBuf>) -> Result<Self> {
        if snapshots.is_empty() {
            return Err(anyhow!("At least one history page snapshot is required"));
        }

        Ok(Self {
            snapshots,
            position: 0,
        })
    }

    /// Snapshot currently shown
    pub fn current(&self) -> &PathBuf {
        &self.snapshots[self.position]
    }
}

#[async_trait]
impl HistoryPage for SnapshotPage {
    async fn scroll_to_bottom(&mut self) -> Result<()> {
        if self.position + 1 < self.snapshots.len() {
            self.position += 1;
        }
        debug!("Showing snapshot {}", self.current().display());
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        let path = self.current();
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read history snapshot {}", path.display()))
    }
}
