//! Defines [`QueueItem`], one request to play a piece of audio, and the
//! conversion from `yt-dlp` JSON metadata.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serenity::all::{User, UserId};
use std::time::Duration;

/// Who asked for a track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.display_name().to_string(),
            avatar_url: Some(user.face()),
        }
    }
}

/// A single entry in the playback queue. Only its position in the queue ever changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueItem {
    /// External identifier (YouTube video id). Doubles as the cache key.
    pub source_id: String,
    /// Locator handed to the downloader when the audio isn't cached.
    pub source_url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub author_url: Option<String>,
    #[serde(with = "humantime_serde")]
    pub duration: Option<Duration>,
    pub view_count: Option<u64>,
    /// Upload date, already formatted for display (`YYYY-MM-DD`).
    pub uploaded_at: Option<String>,
    pub thumbnail_url: Option<String>,
    pub requested_by: Option<Requester>,
    pub requested_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    pub fn new(source_id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            source_url: source_url.into(),
            title: None,
            author: None,
            author_url: None,
            duration: None,
            view_count: None,
            uploaded_at: None,
            thumbnail_url: None,
            requested_by: None,
            requested_at: None,
        }
    }

    /// Stamps the item with its requester and the request time.
    pub fn requested(mut self, requester: Requester, at: DateTime<Utc>) -> Self {
        self.requested_by = Some(requester);
        self.requested_at = Some(at);
        self
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("No Title")
    }

    /// Builds an item from one line of `yt-dlp -j` output.
    ///
    /// Works for both full video metadata and `--flat-playlist` search entries,
    /// which carry fewer fields. Returns `None` for anything without an id.
    pub fn from_ytdlp_json(line: &str) -> Option<Self> {
        let entry: YtDlpEntry = serde_json::from_str(line).ok()?;
        if entry.id.is_empty() {
            return None;
        }

        let source_url = entry
            .webpage_url
            .or(entry.url)
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", entry.id));

        let thumbnail_url = entry.thumbnail.or_else(|| {
            entry
                .thumbnails
                .unwrap_or_default()
                .into_iter()
                .max_by_key(|t| t.width.unwrap_or(0).saturating_mul(t.height.unwrap_or(0)))
                .map(|t| t.url)
        });

        Some(Self {
            title: entry.title,
            author: entry.channel.or(entry.uploader),
            author_url: entry.channel_url.or(entry.uploader_url),
            duration: entry
                .duration
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
            view_count: entry.view_count,
            uploaded_at: entry.upload_date.as_deref().and_then(format_upload_date),
            thumbnail_url,
            ..Self::new(entry.id, source_url)
        })
    }
}

fn format_upload_date(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    #[serde(default)]
    id: String,
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    channel: Option<String>,
    channel_url: Option<String>,
    uploader: Option<String>,
    uploader_url: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    upload_date: Option<String>,
    thumbnail: Option<String>,
    thumbnails: Option<Vec<YtDlpThumbnail>>,
}

#[derive(Debug, Deserialize)]
struct YtDlpThumbnail {
    url: String,
    width: Option<u64>,
    height: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    const FULL_VIDEO: &str = r#"{"id":"dQw4w9WgXcQ","title":"Never Gonna Give You Up","webpage_url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ","channel":"Rick Astley","channel_url":"https://www.youtube.com/channel/UCuAXFkgsw1L7xaCfnd5JJOw","duration":212.0,"view_count":1500000000,"upload_date":"20091025","thumbnail":"https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"}"#;

    const FLAT_ENTRY: &str = r#"{"_type":"url","ie_key":"Youtube","id":"abc123","url":"https://www.youtube.com/watch?v=abc123","title":"Lofi Beats","uploader":"Some Channel","duration":null,"view_count":null,"thumbnails":[{"url":"https://i.ytimg.com/small.jpg","width":168,"height":94},{"url":"https://i.ytimg.com/big.jpg","width":336,"height":188}]}"#;

    #[test]
    fn parses_full_video_metadata() {
        let item = QueueItem::from_ytdlp_json(FULL_VIDEO).unwrap();

        assert_eq!(item.source_id, "dQw4w9WgXcQ");
        assert_eq!(item.source_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(item.display_title(), "Never Gonna Give You Up");
        assert_eq!(item.author.as_deref(), Some("Rick Astley"));
        assert_eq!(item.duration, Some(Duration::from_secs(212)));
        assert_eq!(item.view_count, Some(1_500_000_000));
        assert_eq!(item.uploaded_at.as_deref(), Some("2009-10-25"));
        assert!(item.requested_by.is_none());
    }

    #[test]
    fn flat_entries_fall_back_to_uploader_and_largest_thumbnail() {
        let item = QueueItem::from_ytdlp_json(FLAT_ENTRY).unwrap();

        assert_eq!(item.author.as_deref(), Some("Some Channel"));
        assert_eq!(item.thumbnail_url.as_deref(), Some("https://i.ytimg.com/big.jpg"));
        assert_eq!(item.duration, None);
        assert_eq!(item.uploaded_at, None);
    }

    #[test]
    fn oversized_thumbnail_dimensions_saturate() {
        let line = r#"{"id":"big","thumbnails":[{"url":"https://i.ytimg.com/a.jpg","width":18446744073709551615,"height":18446744073709551615},{"url":"https://i.ytimg.com/b.jpg","width":336,"height":188}]}"#;
        let item = QueueItem::from_ytdlp_json(line).unwrap();
        assert_eq!(item.thumbnail_url.as_deref(), Some("https://i.ytimg.com/a.jpg"));
    }

    #[test]
    fn missing_url_is_derived_from_the_id() {
        let item = QueueItem::from_ytdlp_json(r#"{"id":"xyz"}"#).unwrap();
        assert_eq!(item.source_url, "https://www.youtube.com/watch?v=xyz");
        assert_eq!(item.display_title(), "No Title");
    }

    #[test]
    fn rejects_lines_without_an_id() {
        assert_matches!(QueueItem::from_ytdlp_json(r#"{"title":"no id"}"#), None);
        assert_matches!(QueueItem::from_ytdlp_json("WARNING: not json"), None);
    }

    #[test]
    fn requested_stamps_requester() {
        let requester = Requester {
            id: UserId::new(42),
            name: "ferris".into(),
            avatar_url: None,
        };
        let at = Utc::now();
        let item = QueueItem::new("a", "https://example.com/a").requested(requester.clone(), at);

        assert_eq!(item.requested_by, Some(requester));
        assert_eq!(item.requested_at, Some(at));
    }
}
