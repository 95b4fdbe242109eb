//! Downloads audio with `yt-dlp`, extracting it to Opus.

use serenity::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

use super::backends::{DownloadError, Downloader};

pub struct YtDlpDownloader {
    executable: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlpDownloader {
    pub fn new(executable: impl Into<PathBuf>, cookies: Option<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            cookies,
        }
    }

    /// Arguments for one download. `dest` is `<dir>/<id>.opus`; yt-dlp gets
    /// the extension as a template so the extracted file lands exactly there.
    fn args(&self, locator: &str, dest: &Path, cookies: Option<&Path>) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(cookies) = cookies {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }
        args.extend(
            [
                "--no-playlist",
                "--no-progress",
                "-x",
                "--audio-format",
                "opus",
                "--audio-quality",
                "0",
                "-o",
            ]
            .map(String::from),
        );
        args.push(dest.with_extension("%(ext)s").display().to_string());
        args.push(locator.to_string());
        args
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(&self, locator: &str, dest: &Path) -> Result<(), DownloadError> {
        let cookies = match &self.cookies {
            Some(path) => fs::try_exists(path)
                .await
                .unwrap_or(false)
                .then_some(path.as_path()),
            None => None,
        };
        let args = self.args(locator, dest, cookies);
        debug!("Running {} {}", self.executable.display(), args.join(" "));

        // Killed if the download future is dropped, which is how cancellation works.
        let output = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(DownloadError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.lines().last().unwrap_or_default().trim().to_string();
            warn!("yt-dlp failed for {}: {}", locator, stderr);
            return Err(DownloadError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        if !fs::try_exists(dest).await.unwrap_or(false) {
            return Err(DownloadError::MissingOutput(dest.to_path_buf()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_extraction_arguments() {
        let downloader = YtDlpDownloader::new("yt-dlp", None);
        let args = downloader.args(
            "https://www.youtube.com/watch?v=abc",
            Path::new("data/songs/abc.opus"),
            Some(Path::new("data/cookies.txt")),
        );

        assert_eq!(
            args,
            vec![
                "--cookies",
                "data/cookies.txt",
                "--no-playlist",
                "--no-progress",
                "-x",
                "--audio-format",
                "opus",
                "--audio-quality",
                "0",
                "-o",
                "data/songs/abc.%(ext)s",
                "https://www.youtube.com/watch?v=abc",
            ]
        );
    }

    #[test]
    fn omits_cookies_when_absent() {
        let downloader = YtDlpDownloader::new("yt-dlp", None);
        let args = downloader.args("url", Path::new("abc.opus"), None);
        assert!(!args.iter().any(|arg| arg == "--cookies"));
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let downloader = YtDlpDownloader::new("/nonexistent/suroibot-yt-dlp", None);
        let result = downloader
            .download("url", Path::new("/nonexistent/abc.opus"))
            .await;
        assert_matches!(result, Err(DownloadError::Spawn(_)));
    }
}
