//! Candidate extraction from a rendered history page
use super::identity::absolutize_url;
use super::RawCandidate;
use crate::{HistoryError, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

/// Title anchors of both regular videos and Shorts on the history feed
pub const HISTORY_ITEM_SELECTOR: &str = "a#video-title";

/// Reads `{title, url}` candidates out of a history page snapshot
#[derive(Debug, Clone)]
pub struct HistoryExtractor {
    selector: Selector,
}

impl HistoryExtractor {
    /// Create an extractor for the standard history feed markup
    pub fn new() -> Result<Self> {
        Self::with_selector(HISTORY_ITEM_SELECTOR)
    }

    /// Create an extractor using a custom CSS selector for the title anchors
    pub fn with_selector(css: &str) -> Result<Self> {
        let selector = Selector::parse(css)
            .map_err(|e| HistoryError::Selector(format!("{}: {}", css, e)))?;
        Ok(Self { selector })
    }

    /// Extract candidates in document order, which is newest first on the history feed
    pub fn extract(&self, html: &str) -> Vec<RawCandidate> {
        info!("🔎 Parsing history items...");

        let document = Html::parse_document(html);
        let candidates: Vec<RawCandidate> = document
            .select(&self.selector)
            .filter_map(|element| self.candidate_from(element))
            .collect();

        info!("📋 Extracted {} history items", candidates.len());
        candidates
    }

    fn candidate_from(&self, element: ElementRef<'_>) -> Option<RawCandidate> {
        let href = element.value().attr("href").filter(|href| !href.is_empty())?;

        let title = match element.value().attr("title").map(str::trim).filter(|title| !title.is_empty()) {
            Some(title) => title.to_string(),
            None => element.text().collect::<String>().trim().to_string(),
        };

        if title.is_empty() {
            warn!("Skipping history item without a title: {}", href);
            return None;
        }

        Some(RawCandidate {
            title,
            url: absolutize_url(href),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_logs;

    const HISTORY_PAGE: &str = r#"
        <html><body>
          <ytd-video-renderer>
            <a id="video-title" href="/watch?v=newest" title="Newest video">ignored text</a>
          </ytd-video-renderer>
          <ytd-reel-item-renderer>
            <a id="video-title" href="/shorts/XYZ123/">  日本語のショート  </a>
          </ytd-reel-item-renderer>
          <ytd-video-renderer>
            <a id="video-title" href="https://www.youtube.com/watch?v=oldest" title="Oldest"></a>
          </ytd-video-renderer>
          <a id="video-title">No href</a>
          <a id="video-title" href="/watch?v=untitled"></a>
          <a id="other" href="/watch?v=unrelated" title="Not a history item"></a>
        </body></html>
    "#;

    #[test]
    fn test_extract_preserves_document_order() {
        let extractor = HistoryExtractor::new().unwrap();
        let candidates = extractor.extract(HISTORY_PAGE);

        assert_eq!(
            candidates,
            vec![
                RawCandidate::new("Newest video", "https://www.youtube.com/watch?v=newest"),
                RawCandidate::new("日本語のショート", "https://www.youtube.com/shorts/XYZ123/"),
                RawCandidate::new("Oldest", "https://www.youtube.com/watch?v=oldest"),
            ]
        );
    }

    #[test]
    fn test_untitled_anchor_logs_warning() {
        let (logs, _guard) = capture_logs();
        let extractor = HistoryExtractor::new().unwrap();

        let candidates = extractor.extract(r#"<a id="video-title" href="/watch?v=untitled"> </a>"#);

        assert!(candidates.is_empty());
        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("/watch?v=untitled"));
    }

    #[test]
    fn test_absolute_href_kept_verbatim() {
        let extractor = HistoryExtractor::new().unwrap();
        let page = r#"<a id="video-title" href="https://WWW.YouTube.com/watch?v=abc&t=1 s" title="Raw"></a>"#;

        let candidates = extractor.extract(page);

        assert_eq!(candidates[0].url, "https://WWW.YouTube.com/watch?v=abc&t=1 s");
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        let extractor = HistoryExtractor::new().unwrap();
        assert!(extractor.extract("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            HistoryExtractor::with_selector("a[[").unwrap_err(),
            HistoryError::Selector(_)
        ));
    }
}
