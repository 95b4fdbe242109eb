//! The seams between the [`SongManager`](super::song_manager::SongManager) and
//! the outside world: voice transport, downloader, download cache, notification
//! sink and search. Production implementations live in `discord_backend`,
//! `downloader`, `song_cache` and `youtube`.

use serenity::all::{ChannelId, GuildId};
use serenity::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::queue_item::QueueItem;
use super::song_manager::{MusicResult, SessionEvents};

/// Identifies one play cycle. Download completions and "track finished"
/// events carry it so the manager can drop anything stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackToken(pub(crate) u64);

/// Identifies one voice connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionToken(pub(crate) u64);

impl fmt::Display for TrackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

impl fmt::Display for ConnectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection#{}", self.0)
    }
}

/// The voice channel a session should bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceTarget {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
}

/// A cached, locally readable audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioResource {
    pub source_id: String,
    pub path: PathBuf,
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Failed to start the downloader: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Downloader exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("Downloader finished without producing {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("Download timed out after {0:?}")]
    TimedOut(Duration),
}

/// Opens voice connections.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Binds to `target`. The returned connection reports track ends and its
    /// own loss through `events`, tagged with `token`.
    async fn join(
        &self,
        target: VoiceTarget,
        token: ConnectionToken,
        events: SessionEvents,
    ) -> MusicResult<Box<dyn VoiceConnection>>;
}

/// A live voice connection with a single-track player.
#[async_trait]
pub trait VoiceConnection: Send {
    /// Replaces whatever the player holds with `resource`. The connection must
    /// report `track_finished(token)` once playback of this resource ends.
    async fn play(&mut self, resource: AudioResource, token: TrackToken) -> MusicResult<()>;
    async fn pause(&mut self) -> MusicResult<()>;
    async fn unpause(&mut self) -> MusicResult<()>;
    async fn stop(&mut self) -> MusicResult<()>;
    /// Leaves the channel. Best effort, never fails.
    async fn destroy(&mut self);
}

/// Fetches audio for a locator into a destination file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, locator: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Download cache keyed by source id.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn contains(&self, key: &str) -> bool;
    /// Where a download for `key` should be written.
    fn target_path(&self, key: &str) -> PathBuf;
    async fn open(&self, key: &str) -> MusicResult<AudioResource>;
}

/// Fire-and-forget "now playing" announcements.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn now_playing(&self, channel: ChannelId, item: QueueItem);
}

/// Resolves a free-text query or a URL to candidate items.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> MusicResult<Vec<QueueItem>>;
}
