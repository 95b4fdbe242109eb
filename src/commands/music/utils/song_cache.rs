//! On-disk download cache: one `<dir>/<source_id>.opus` file per item.

use regex::Regex;
use serenity::async_trait;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;

use super::backends::{AudioResource, CacheStore};
use super::song_manager::{MusicError, MusicResult};

const EXTENSION: &str = "opus";

/// Characters outside this set are replaced so a key can never escape the cache directory.
static UNSAFE_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());

pub struct FsCacheStore {
    dir: PathBuf,
}

impl FsCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the cache directory if it's missing.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    fn file_name(key: &str) -> String {
        let stem = UNSAFE_KEY_CHARS.replace_all(key, "_");
        let stem = if stem.is_empty() { "_".into() } else { stem };
        format!("{stem}.{EXTENSION}")
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn contains(&self, key: &str) -> bool {
        fs::try_exists(self.target_path(key)).await.unwrap_or(false)
    }

    fn target_path(&self, key: &str) -> PathBuf {
        self.dir.join(Self::file_name(key))
    }

    async fn open(&self, key: &str) -> MusicResult<AudioResource> {
        let path = self.target_path(key);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(AudioResource {
                source_id: key.to_string(),
                path,
            }),
            Ok(_) => Err(MusicError::AudioSourceError(format!(
                "{} is not a file",
                path.display()
            ))),
            Err(e) => Err(MusicError::AudioSourceError(format!(
                "Cached audio for {} is unavailable: {}",
                key, e
            ))),
        }
    }
}
