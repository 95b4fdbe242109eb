mod common;

use pretty_assertions::assert_eq;
use std::time::Duration;

use suroibot::commands::music::utils::youtube::parse_search_output;

#[test]
fn parses_a_recorded_search() {
    let items = parse_search_output(&common::fixture("ytdlp_search.jsonl"), 5);

    let ids: Vec<&str> = items.iter().map(|item| item.source_id.as_str()).collect();
    assert_eq!(ids, vec!["dQw4w9WgXcQ", "yPYZpwSpKmA", "3BFTio5296w"]);

    let first = &items[0];
    assert_eq!(first.author.as_deref(), Some("Rick Astley"));
    assert_eq!(first.duration, Some(Duration::from_secs(212)));
    assert_eq!(first.view_count, Some(1_500_000_000));
    assert_eq!(
        first.thumbnail_url.as_deref(),
        Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
    );

    let last = &items[2];
    assert_eq!(last.display_title(), "No Title");
    assert_eq!(last.duration, None);
    assert_eq!(last.thumbnail_url, None);
}

#[test]
fn limit_applies_after_skipping_bad_lines() {
    let items = parse_search_output(&common::fixture("ytdlp_search.jsonl"), 2);
    assert_eq!(items.len(), 2);
}
