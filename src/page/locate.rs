// Video card location. Selector lists are data, not code: each list is
// tried in order and the first selector that hits anything wins, which is
// what keeps grid pages from double-matching their nested renderers.

use std::collections::HashSet;

use url::Url;

use crate::page::dom::{Document, NodeId};
use crate::page::selector::Selector;

/// The selector lists a scan pass works from.
#[derive(Debug, Clone)]
pub struct ScanSelectors {
    /// Card containers on platform pages, most specific renderers first.
    pub video_cards: Vec<Selector>,
    /// Shorter card list used when judging growth batches.
    pub watcher_cards: Vec<Selector>,
    /// Links inside a card that carry the watch URL.
    pub watch_links: Vec<Selector>,
    /// Thumbnail anchors; a card without one is not worth a fetch.
    pub thumbnail_links: Vec<Selector>,
    /// Any anchor with a watch-ish href, for the fallback walk.
    pub watch_anchor: Selector,
    /// Containers the fallback walk climbs to from a bare thumbnail.
    pub fallback_containers: Vec<Selector>,
    /// Title candidates inside a platform card.
    pub title_candidates: Vec<Selector>,
    /// Result blocks around a YouTube link on Google search pages.
    pub result_containers: Vec<Selector>,
    /// Title candidates inside a Google result block.
    pub result_titles: Vec<Selector>,
}

impl Default for ScanSelectors {
    fn default() -> Self {
        Self {
            video_cards: Selector::parse_list(&[
                "ytd-rich-grid-media",
                "ytd-rich-item-renderer ytd-rich-grid-media",
                "ytd-video-renderer",
                "ytd-grid-video-renderer",
                "ytd-rich-item-renderer",
                "ytd-compact-video-renderer",
                "ytd-video-renderer.ytd-item-section-renderer",
                "ytd-compact-video-renderer.ytd-item-section-renderer",
                "ytd-watch-card-renderer",
                "ytd-playlist-video-renderer",
                "ytd-horizontal-card-list-renderer ytd-grid-video-renderer",
            ]),
            watcher_cards: Selector::parse_list(&[
                "ytd-rich-grid-media",
                "ytd-rich-item-renderer ytd-rich-grid-media",
                "ytd-video-renderer",
                "ytd-grid-video-renderer",
                "ytd-rich-item-renderer",
                "ytd-compact-video-renderer",
            ]),
            watch_links: Selector::parse_list(&[
                "a#thumbnail",
                "a.ytd-thumbnail",
                r#"a[href*="/watch"]"#,
                "a",
            ]),
            thumbnail_links: Selector::parse_list(&[
                "a#thumbnail",
                "a.ytd-thumbnail",
                r#"a[href*="/watch"]"#,
            ]),
            watch_anchor: Selector::parse(r#"a[href*="/watch"]"#),
            fallback_containers: Selector::parse_list(&[
                r#"[id*="video"]"#,
                r#"[class*="video"]"#,
                "ytd-rich-grid-media",
                "ytd-grid-video-renderer",
                "ytd-video-renderer",
                "ytd-compact-video-renderer",
            ]),
            title_candidates: Selector::parse_list(&[
                "#video-title",
                ".title",
                r#"[id*="title"]"#,
                r#"[class*="title"]"#,
                "h3",
                "a[title]",
            ]),
            result_containers: Selector::parse_list(&[
                ".g",
                "[data-hveid]",
                "div[data-sokoban-feature]",
            ]),
            result_titles: Selector::parse_list(&["h3", r#"[role="heading"]"#, r#"[class*="title"]"#]),
        }
    }
}

/// One annotatable video occurrence on the page.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub container: NodeId,
    /// Anchor the URL came from. Google passes fall back to it for titles.
    pub link: Option<NodeId>,
    pub video_id: String,
    pub url: String,
}

/// All video cards on a platform page. When no card selector hits, fall
/// back to walking up from watch-link thumbnails.
pub fn platform_cards(doc: &Document, selectors: &ScanSelectors) -> Vec<NodeId> {
    for selector in &selectors.video_cards {
        let found = doc.query_all(selector);
        if !found.is_empty() {
            return found;
        }
    }

    let img = Selector::parse("img");
    doc.query_all(&selectors.watch_anchor)
        .into_iter()
        .filter(|&anchor| {
            doc.find_within(anchor, &img).is_some()
                && doc.attr(anchor, "href").is_some_and(|h| !h.contains("&list="))
                && selectors
                    .fallback_containers
                    .iter()
                    .any(|s| doc.closest(anchor, s).is_some())
        })
        .map(|anchor| {
            selectors
                .fallback_containers
                .iter()
                .find_map(|s| doc.closest(anchor, s))
                .unwrap_or(anchor)
        })
        .collect()
}

/// Platform cards that carry no annotation marker or overlay anywhere in
/// their subtree. Incremental passes start here.
pub fn new_platform_cards(doc: &Document, selectors: &ScanSelectors) -> Vec<NodeId> {
    platform_cards(doc, selectors)
        .into_iter()
        .filter(|&card| !crate::page::annotate::is_processed(doc, card))
        .collect()
}

/// Resolve a card to its watch URL. Returns the href and the anchor it came
/// from; a card that is itself a watch anchor resolves to its own href.
pub fn resolve_watch_url(
    doc: &Document,
    container: NodeId,
    selectors: &ScanSelectors,
) -> Option<(String, Option<NodeId>)> {
    for selector in &selectors.watch_links {
        if let Some(link) = doc.find_within(container, selector) {
            if let Some(href) = doc.attr(link, "href") {
                if href.contains("/watch?v=") {
                    return Some((href.to_string(), Some(link)));
                }
            }
        }
    }
    if doc.tag(container) == "a" {
        if let Some(href) = doc.attr(container, "href") {
            if href.contains("/watch?v=") {
                return Some((href.to_string(), None));
            }
        }
    }
    None
}

/// The video id is the `v` query parameter. Relative hrefs are resolved
/// against the platform origin, the way a browser would have.
pub fn video_id_from_url(href: &str) -> Option<String> {
    let parsed = Url::parse(href)
        .or_else(|_| Url::parse("https://www.youtube.com/").and_then(|base| base.join(href)))
        .ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}

pub fn candidate_for(
    doc: &Document,
    container: NodeId,
    selectors: &ScanSelectors,
) -> Option<Candidate> {
    let (url, link) = resolve_watch_url(doc, container, selectors)?;
    let video_id = video_id_from_url(&url)?;
    Some(Candidate {
        container,
        link,
        video_id,
        url,
    })
}

/// The thumbnail anchor of a card, if any.
pub fn thumbnail_link(doc: &Document, container: NodeId, selectors: &ScanSelectors) -> Option<NodeId> {
    selectors
        .thumbnail_links
        .iter()
        .find_map(|s| doc.find_within(container, s))
}

/// YouTube video links in a Google results page, deduplicated by video id
/// with the first occurrence winning. Each link is wrapped in its nearest
/// result block when one exists.
pub fn google_candidates(doc: &Document, selectors: &ScanSelectors) -> Vec<Candidate> {
    let anchor = Selector::parse("a");
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for link in doc.query_all(&anchor) {
        let Some(href) = doc.attr(link, "href") else {
            continue;
        };
        if !href.contains("youtube.com/watch") {
            continue;
        }
        let Some(video_id) = video_id_from_url(href) else {
            continue;
        };
        if !seen.insert(video_id.clone()) {
            continue;
        }
        let container = selectors
            .result_containers
            .iter()
            .find_map(|s| doc.closest(link, s))
            .unwrap_or(link);
        out.push(Candidate {
            container,
            link: Some(link),
            video_id,
            url: href.to_string(),
        });
    }
    out
}

/// Whether a grown subtree contains (or is) a video card.
pub fn subtree_has_cards(doc: &Document, node: NodeId, selectors: &ScanSelectors) -> bool {
    selectors
        .watcher_cards
        .iter()
        .any(|s| doc.matches(node, s) || doc.find_within(node, s).is_some())
}
