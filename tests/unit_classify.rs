// Page classification: which URLs get which scan mode.

use ratioed::page::classify::{classify_str, PageMode};

#[test]
fn youtube_front_page_and_feeds_are_homepage() {
    assert_eq!(classify_str("https://www.youtube.com/"), PageMode::Homepage);
    assert_eq!(classify_str("https://youtube.com/"), PageMode::Homepage);
    assert_eq!(
        classify_str("https://www.youtube.com/?gl=US"),
        PageMode::Homepage
    );
    assert_eq!(
        classify_str("https://www.youtube.com/feed/trending"),
        PageMode::Homepage
    );
    assert_eq!(
        classify_str("https://www.youtube.com/feed/subscriptions"),
        PageMode::Homepage
    );
}

#[test]
fn youtube_search_results_are_search() {
    assert_eq!(
        classify_str("https://www.youtube.com/results?search_query=rust"),
        PageMode::Search
    );
    assert_eq!(
        classify_str("https://www.youtube.com/feed/history?search_query=rust"),
        PageMode::Search
    );
}

#[test]
fn other_youtube_pages_are_watch_style() {
    assert_eq!(
        classify_str("https://www.youtube.com/watch?v=abc123"),
        PageMode::Watch
    );
    assert_eq!(
        classify_str("https://www.youtube.com/@somechannel"),
        PageMode::Watch
    );
    assert_eq!(
        classify_str("https://music.youtube.com/playlist?list=x"),
        PageMode::Watch
    );
}

#[test]
fn google_search_is_its_own_mode() {
    assert_eq!(
        classify_str("https://www.google.com/search?q=rust+videos"),
        PageMode::GoogleResults
    );
    assert_eq!(
        classify_str("https://google.com/search?q=x"),
        PageMode::GoogleResults
    );
    // other google surfaces are not search results
    assert_eq!(
        classify_str("https://www.google.com/maps"),
        PageMode::Unsupported
    );
}

#[test]
fn lookalike_hosts_are_unsupported() {
    assert_eq!(
        classify_str("https://notyoutube.com/watch?v=abc"),
        PageMode::Unsupported
    );
    assert_eq!(
        classify_str("https://youtube.com.evil.example/watch?v=abc"),
        PageMode::Unsupported
    );
    assert_eq!(classify_str("https://example.com/"), PageMode::Unsupported);
    assert_eq!(classify_str("not a url"), PageMode::Unsupported);
}

#[test]
fn platform_modes_drive_the_watcher() {
    assert!(PageMode::Homepage.is_platform());
    assert!(PageMode::Search.is_platform());
    assert!(PageMode::Watch.is_platform());
    assert!(!PageMode::GoogleResults.is_platform());
    assert!(!PageMode::Unsupported.is_platform());
}
