//! Resolves queries to [`QueueItem`]s with `yt-dlp`: free text goes through
//! `ytsearchN:`, URLs are looked up directly.

use regex::Regex;
use serenity::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use super::backends::SearchProvider;
use super::queue_item::QueueItem;
use super::song_manager::{MusicError, MusicResult};

/// Regex to match and capture YouTube video URLs (various formats).
static YOUTUBE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:https?:)?//)?((?:www|m|music)\.)?(youtube\.com|youtu\.be)(/(?:[\w\-]+\?v=|embed/|v/|shorts/)?)([\w\-]+)(\S+)?$").unwrap()
});

/// Performs a basic check if the input string can be parsed as an http(s) URL.
pub fn is_url(input: &str) -> bool {
    Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Extracts the video id from the usual YouTube URL shapes.
pub fn extract_video_id(url: &str) -> Option<String> {
    YOUTUBE_REGEX
        .captures(url)
        .and_then(|captures| captures.get(5))
        .map(|m| m.as_str().to_string())
}

pub struct YtDlpSearch {
    executable: PathBuf,
}

impl YtDlpSearch {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// What to hand yt-dlp for a query. YouTube links are reduced to their
    /// watch URL so playlist parameters don't leak in.
    fn target(query: &str, limit: usize) -> String {
        if is_url(query) {
            match extract_video_id(query) {
                Some(id) => format!("https://www.youtube.com/watch?v={}", id),
                None => query.to_string(),
            }
        } else {
            format!("ytsearch{}:{}", limit, query)
        }
    }
}

/// Parses `yt-dlp -j` output, one JSON document per line.
pub fn parse_search_output(stdout: &str, limit: usize) -> Vec<QueueItem> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(QueueItem::from_ytdlp_json)
        .take(limit)
        .collect()
}

#[async_trait]
impl SearchProvider for YtDlpSearch {
    async fn search(&self, query: &str, limit: usize) -> MusicResult<Vec<QueueItem>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Err(MusicError::NoResults);
        }

        let target = Self::target(query, limit);
        info!("Searching for {}", target);

        let output = Command::new(&self.executable)
            .args(["-j", "--flat-playlist", "--no-warnings", &target])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MusicError::AudioSourceError(format!("Failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::AudioSourceError(format!(
                "yt-dlp lookup failed: {}",
                stderr.lines().last().unwrap_or_default().trim()
            )));
        }

        let items = parse_search_output(&String::from_utf8_lossy(&output.stdout), limit);
        debug!("{} result(s) for {}", items.len(), target);
        if items.is_empty() {
            return Err(MusicError::NoResults);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Some("dQw4w9WgXcQ"))]
    #[case("https://youtu.be/dQw4w9WgXcQ", Some("dQw4w9WgXcQ"))]
    #[case("https://m.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123", Some("dQw4w9WgXcQ"))]
    #[case("https://www.youtube.com/shorts/abc_DEF-123", Some("abc_DEF-123"))]
    #[case("https://example.com/watch?v=dQw4w9WgXcQ", None)]
    fn extracts_video_ids(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_video_id(url).as_deref(), expected);
    }

    #[rstest]
    #[case("never gonna give you up", "ytsearch5:never gonna give you up")]
    #[case(
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
    )]
    #[case("https://soundcloud.com/artist/track", "https://soundcloud.com/artist/track")]
    fn builds_lookup_targets(#[case] query: &str, #[case] expected: &str) {
        assert_eq!(YtDlpSearch::target(query, 5), expected);
    }

    #[test]
    fn plain_words_are_not_urls() {
        assert!(is_url("https://youtu.be/abc"));
        assert!(!is_url("lofi hip hop"));
        assert!(!is_url("ftp://example.com/file"));
    }

    #[test]
    fn parses_json_lines_and_honours_limit() {
        let stdout = concat!(
            r#"{"id":"one","title":"First"}"#,
            "\n\n",
            "not json\n",
            r#"{"id":"two","title":"Second"}"#,
            "\n",
            r#"{"id":"three","title":"Third"}"#,
            "\n",
        );

        let items = parse_search_output(stdout, 2);
        let ids: Vec<_> = items.iter().map(|item| item.source_id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn empty_queries_have_no_results() {
        let search = YtDlpSearch::new("yt-dlp");
        assert!(matches!(
            search.search("   ", 5).await,
            Err(MusicError::NoResults)
        ));
    }
}
