//! Video identity resolution for watch-page and Shorts URLs

use url::Url;

/// Origin that site-relative links on the history page are resolved against
pub const BASE_ORIGIN: &str = "https://www.youtube.com";

/// Query parameter naming the video on a watch page
const WATCH_PARAM: &str = "v";

/// Path marker preceding the video id in a Shorts URL
pub(crate) const SHORTS_MARKER: &str = "/shorts/";

/// Resolve a watch-page or Shorts URL to its canonical video id.
///
/// `https://www.youtube.com/watch?v=ID&t=30` and `/shorts/ID/` both yield `ID`.
/// Returns `None` for anything else; callers drop such candidates.
pub fn resolve_video_id(raw_url: &str) -> Option<String> {
    let url = parse_with_base(raw_url)?;

    if let Some(id) = query_param(&url, WATCH_PARAM) {
        return Some(id);
    }

    let path = url.path();
    let start = path.rfind(SHORTS_MARKER)? + SHORTS_MARKER.len();
    let id = path[start..].split('/').next().unwrap_or_default();

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// First non-empty value of a query parameter
pub(crate) fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Parse an absolute URL, or resolve a site-relative one against [`BASE_ORIGIN`]
pub(crate) fn parse_with_base(raw_url: &str) -> Option<Url> {
    let raw_url = raw_url.trim();
    if raw_url.is_empty() {
        return None;
    }

    match Url::parse(raw_url) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(BASE_ORIGIN).ok()?.join(raw_url).ok()
        }
        Err(_) => None,
    }
}

/// Turn a site-relative `href` into an absolute URL string.
/// Anything not starting with `/` is kept exactly as observed.
pub fn absolutize_url(href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", BASE_ORIGIN, href)
    } else {
        href.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            resolve_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            resolve_video_id("https://www.youtube.com/watch?list=PL123&v=abc&t=42s").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_watch_param_takes_first_non_empty_value() {
        assert_eq!(resolve_video_id("/watch?v=&v=second&v=third").as_deref(), Some("second"));
    }

    #[test]
    fn test_relative_shorts_with_trailing_segment() {
        assert_eq!(resolve_video_id("/shorts/XYZ123/").as_deref(), Some("XYZ123"));
        assert_eq!(resolve_video_id("/shorts/XYZ123").as_deref(), Some("XYZ123"));
    }

    #[test]
    fn test_absolute_shorts_with_query() {
        assert_eq!(
            resolve_video_id("https://www.youtube.com/shorts/AbC_-9?feature=share").as_deref(),
            Some("AbC_-9")
        );
    }

    #[test]
    fn test_watch_param_wins_over_shorts_path() {
        assert_eq!(resolve_video_id("/shorts/first?v=second").as_deref(), Some("second"));
    }

    #[test]
    fn test_unresolvable_urls() {
        assert_eq!(resolve_video_id(""), None);
        assert_eq!(resolve_video_id("https://www.youtube.com/feed/history"), None);
        assert_eq!(resolve_video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(resolve_video_id("/shorts/"), None);
        assert_eq!(resolve_video_id("/playlist?list=PL123"), None);
    }

    #[test]
    fn test_absolutize_url() {
        assert_eq!(absolutize_url("/watch?v=abc"), "https://www.youtube.com/watch?v=abc");
        assert_eq!(
            absolutize_url("https://m.youtube.com/shorts/xyz"),
            "https://m.youtube.com/shorts/xyz"
        );
        assert_eq!(
            absolutize_url("https://WWW.YouTube.com/watch?v=Ab%20c&t=1 s"),
            "https://WWW.YouTube.com/watch?v=Ab%20c&t=1 s"
        );
        assert_eq!(absolutize_url("/shorts/日本"), "https://www.youtube.com/shorts/日本");
    }
}
