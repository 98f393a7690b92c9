// Candidate location: card selector precedence, the thumbnail fallback
// walk, watch-URL extraction, and Google result deduplication.

use ratioed::page::locate::{
    self, google_candidates, platform_cards, subtree_has_cards, video_id_from_url,
};
use ratioed::page::{Document, NodeId, ScanSelectors};

fn element(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let id = doc.create_element(tag);
    for (name, value) in attrs {
        doc.set_attr(id, name, value);
    }
    doc.append_child(parent, id);
    id
}

/// A minimal grid card: thumbnail link with an img, plus a title anchor.
fn grid_card(doc: &mut Document, parent: NodeId, video_id: &str) -> NodeId {
    let card = element(doc, parent, "ytd-rich-grid-media", &[]);
    let href = format!("/watch?v={video_id}");
    let thumb = element(doc, card, "a", &[("id", "thumbnail"), ("href", &href)]);
    element(doc, thumb, "img", &[("src", "t.jpg")]);
    let title = element(doc, card, "a", &[("id", "video-title")]);
    doc.append_text(title, &format!("Video {video_id}"));
    card
}

#[test]
fn video_id_comes_from_the_v_parameter() {
    assert_eq!(
        video_id_from_url("https://www.youtube.com/watch?v=abc123"),
        Some("abc123".to_string())
    );
    // relative hrefs resolve against the platform origin
    assert_eq!(
        video_id_from_url("/watch?v=xyz&t=42"),
        Some("xyz".to_string())
    );
    assert_eq!(video_id_from_url("/watch"), None);
    assert_eq!(video_id_from_url("/watch?v="), None);
    assert_eq!(video_id_from_url("/playlist?list=PL123"), None);
}

#[test]
fn first_matching_card_selector_wins() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();
    // both a grid card and an old-style renderer are present; the grid
    // selector is earlier in the list, so only grid cards are returned
    grid_card(&mut doc, root, "grid1");
    let legacy = element(&mut doc, root, "ytd-video-renderer", &[]);

    let cards = platform_cards(&doc, &selectors);
    assert_eq!(cards.len(), 1);
    assert!(!cards.contains(&legacy));
}

#[test]
fn fallback_walk_finds_containers_around_bare_thumbnails() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();

    // no known renderer tags anywhere, just a div with a video-ish class
    let container = element(&mut doc, root, "div", &[("class", "video-item")]);
    let thumb = element(
        &mut doc,
        container,
        "a",
        &[("href", "/watch?v=fb1")],
    );
    element(&mut doc, thumb, "img", &[]);

    let cards = platform_cards(&doc, &selectors);
    assert_eq!(cards, vec![container]);
}

#[test]
fn fallback_walk_skips_playlists_and_imageless_links() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();

    let container = element(&mut doc, root, "div", &[("class", "video-item")]);
    // playlist-flavored link
    let playlist = element(
        &mut doc,
        container,
        "a",
        &[("href", "/watch?v=pl1&list=PL99")],
    );
    element(&mut doc, playlist, "img", &[]);
    // watch link without a thumbnail image
    element(&mut doc, container, "a", &[("href", "/watch?v=noimg")]);

    assert!(platform_cards(&doc, &selectors).is_empty());
}

#[test]
fn candidate_resolution_reads_the_thumbnail_href() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();
    let card = grid_card(&mut doc, root, "abc123");

    let candidate = locate::candidate_for(&doc, card, &selectors).unwrap();
    assert_eq!(candidate.video_id, "abc123");
    assert_eq!(candidate.url, "/watch?v=abc123");
    assert_eq!(candidate.container, card);
    assert!(candidate.link.is_some());
}

#[test]
fn thumbnail_link_requires_an_inner_anchor() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();

    let card = grid_card(&mut doc, root, "abc123");
    assert!(locate::thumbnail_link(&doc, card, &selectors).is_some());

    // a container that is itself the watch anchor has nothing inside it
    // for the thumbnail gate to find
    let bare = element(
        &mut doc,
        root,
        "a",
        &[("class", "video-item"), ("href", "/watch?v=bare")],
    );
    element(&mut doc, bare, "img", &[]);
    assert!(locate::thumbnail_link(&doc, bare, &selectors).is_none());
}

#[test]
fn cards_without_watch_links_yield_no_candidate() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();
    let card = element(&mut doc, root, "ytd-rich-grid-media", &[]);
    element(&mut doc, card, "a", &[("href", "/playlist?list=PL1")]);

    assert!(locate::candidate_for(&doc, card, &selectors).is_none());
}

#[test]
fn google_candidates_dedupe_by_video_id() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();

    for (video_id, wrap) in [("g1", true), ("g2", true), ("g1", false)] {
        let parent = if wrap {
            element(&mut doc, root, "div", &[("class", "g")])
        } else {
            root
        };
        let href = format!("https://www.youtube.com/watch?v={video_id}");
        element(&mut doc, parent, "a", &[("href", &href)]);
    }
    // a non-YouTube link is never a candidate
    element(
        &mut doc,
        root,
        "a",
        &[("href", "https://vimeo.com/watch?v=nope")],
    );

    let candidates = google_candidates(&doc, &selectors);
    let ids: Vec<_> = candidates.iter().map(|c| c.video_id.as_str()).collect();
    assert_eq!(ids, vec!["g1", "g2"]);
}

#[test]
fn google_candidates_wrap_links_in_their_result_block() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();

    let block = element(&mut doc, root, "div", &[("class", "g")]);
    let wrapped = element(
        &mut doc,
        block,
        "a",
        &[("href", "https://www.youtube.com/watch?v=in")],
    );
    // a bare link falls back to being its own container
    let bare = element(
        &mut doc,
        root,
        "a",
        &[("href", "https://www.youtube.com/watch?v=out")],
    );

    let candidates = google_candidates(&doc, &selectors);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].container, block);
    assert_eq!(candidates[0].link, Some(wrapped));
    assert_eq!(candidates[1].container, bare);
}

#[test]
fn growth_batches_are_judged_by_card_content() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();

    let plain = element(&mut doc, root, "div", &[]);
    element(&mut doc, plain, "p", &[]);
    assert!(!subtree_has_cards(&doc, plain, &selectors));

    let wrapper = element(&mut doc, root, "div", &[]);
    element(&mut doc, wrapper, "ytd-rich-grid-media", &[]);
    assert!(subtree_has_cards(&doc, wrapper, &selectors));

    // a node that is itself a card counts too
    let card = element(&mut doc, root, "ytd-video-renderer", &[]);
    assert!(subtree_has_cards(&doc, card, &selectors));
}

#[test]
fn new_cards_exclude_already_processed_subtrees() {
    let selectors = ScanSelectors::default();
    let mut doc = Document::new();
    let root = doc.root();
    let done = grid_card(&mut doc, root, "done");
    let fresh = grid_card(&mut doc, root, "fresh");

    let title = doc
        .find_within(done, &ratioed::page::Selector::parse("#video-title"))
        .unwrap();
    ratioed::page::annotate::annotate_title(
        &mut doc,
        title,
        &ratioed::ratio::RatioDisplay {
            prefix: "[5.0%] ".to_string(),
            tier: ratioed::ratio::RatioTier::Medium,
        },
        "tip",
    );

    let new_cards = locate::new_platform_cards(&doc, &selectors);
    assert_eq!(new_cards, vec![fresh]);
}
