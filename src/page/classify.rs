// Page classification. The mode decides which scan pass runs and whether
// the mutation watcher gets armed.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageMode {
    /// Platform front page or one of the feed pages.
    Homepage,
    /// Platform search results.
    Search,
    /// Any other platform page, watch pages included.
    Watch,
    /// Google web search, which can carry YouTube video links.
    GoogleResults,
    #[default]
    Unsupported,
}

const FEED_PATHS: [&str; 3] = ["/feed/trending", "/feed/explore", "/feed/subscriptions"];

impl PageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageMode::Homepage => "homepage",
            PageMode::Search => "search",
            PageMode::Watch => "watch",
            PageMode::GoogleResults => "google-results",
            PageMode::Unsupported => "unsupported",
        }
    }

    /// True for pages hosted on the video platform itself. These are the
    /// modes that watch for late-loading cards.
    pub fn is_platform(&self) -> bool {
        matches!(self, PageMode::Homepage | PageMode::Search | PageMode::Watch)
    }
}

impl std::fmt::Display for PageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a page URL. Check order matters: the homepage test runs before
/// the search test, and anything else on the platform is a watch-style page.
pub fn classify(url: &Url) -> PageMode {
    let host = url.host_str().unwrap_or("");

    if is_youtube_host(host) {
        if is_bare_root(url) || FEED_PATHS.iter().any(|p| url.path().starts_with(p)) {
            return PageMode::Homepage;
        }
        if url.path().starts_with("/results") || has_query_param(url, "search_query") {
            return PageMode::Search;
        }
        return PageMode::Watch;
    }

    if is_google_host(host) && url.path().starts_with("/search") {
        return PageMode::GoogleResults;
    }

    PageMode::Unsupported
}

/// Lenient entry point for URLs arriving over the wire.
pub fn classify_str(url: &str) -> PageMode {
    match Url::parse(url) {
        Ok(parsed) => classify(&parsed),
        Err(_) => PageMode::Unsupported,
    }
}

fn is_youtube_host(host: &str) -> bool {
    host == "youtube.com" || host.ends_with(".youtube.com")
}

fn is_google_host(host: &str) -> bool {
    host == "google.com" || host.ends_with(".google.com")
}

/// The front page proper: youtube.com with an empty path, optionally with a
/// query string, but not a fragment and not a port.
fn is_bare_root(url: &Url) -> bool {
    (url.host_str() == Some("youtube.com") || url.host_str() == Some("www.youtube.com"))
        && url.port().is_none()
        && matches!(url.path(), "" | "/")
        && url.fragment().is_none()
}

fn has_query_param(url: &Url, name: &str) -> bool {
    url.query_pairs().any(|(key, _)| key == name)
}
