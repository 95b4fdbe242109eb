//! In-memory stand-ins for the song manager's backends.

use async_trait::async_trait;
use mockall::mock;
use serenity::all::{ChannelId, GuildId};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use suroibot::commands::music::utils::{
    backends::{
        AudioResource, CacheStore, ConnectionToken, DownloadError, Downloader, Notifier,
        TrackToken, VoiceConnection, VoiceTarget, VoiceTransport,
    },
    queue_item::QueueItem,
    song_manager::{Backends, MusicError, MusicResult, SessionEvents, SessionSnapshot, SongManager},
};

pub const TARGET: VoiceTarget = VoiceTarget {
    guild_id: GuildId::new(1),
    channel_id: ChannelId::new(2),
};
pub const TEXT_CHANNEL: ChannelId = ChannelId::new(3);

pub fn item(id: &str) -> QueueItem {
    let mut item = QueueItem::new(id, format!("https://www.youtube.com/watch?v={}", id));
    item.title = Some(format!("Song {}", id));
    item
}

pub fn ids(items: &[QueueItem]) -> Vec<&str> {
    items.iter().map(|item| item.source_id.as_str()).collect()
}

/// Everything the fake voice layer was asked to do.
#[derive(Default)]
pub struct VoiceLog {
    pub joins: Vec<ConnectionToken>,
    pub plays: Vec<(String, TrackToken)>,
    pub pauses: usize,
    pub unpauses: usize,
    pub stops: usize,
    pub destroys: usize,
    /// Event sink handed over by the most recent join.
    pub events: Option<SessionEvents>,
}

#[derive(Clone, Default)]
pub struct FakeVoice {
    log: Arc<Mutex<VoiceLog>>,
}

impl FakeVoice {
    pub fn log(&self) -> MutexGuard<'_, VoiceLog> {
        self.log.lock().unwrap()
    }

    pub fn played(&self) -> Vec<String> {
        self.log().plays.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn last_track(&self) -> TrackToken {
        self.log().plays.last().expect("nothing was played").1
    }

    pub fn events(&self) -> SessionEvents {
        self.log().events.clone().expect("never joined")
    }

    pub fn last_connection(&self) -> ConnectionToken {
        *self.log().joins.last().expect("never joined")
    }
}

#[async_trait]
impl VoiceTransport for FakeVoice {
    async fn join(
        &self,
        _target: VoiceTarget,
        token: ConnectionToken,
        events: SessionEvents,
    ) -> MusicResult<Box<dyn VoiceConnection>> {
        let mut log = self.log();
        log.joins.push(token);
        log.events = Some(events);
        Ok(Box::new(FakeConnection {
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeConnection {
    log: Arc<Mutex<VoiceLog>>,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    async fn play(&mut self, resource: AudioResource, token: TrackToken) -> MusicResult<()> {
        self.log.lock().unwrap().plays.push((resource.source_id, token));
        Ok(())
    }

    async fn pause(&mut self) -> MusicResult<()> {
        self.log.lock().unwrap().pauses += 1;
        Ok(())
    }

    async fn unpause(&mut self) -> MusicResult<()> {
        self.log.lock().unwrap().unpauses += 1;
        Ok(())
    }

    async fn stop(&mut self) -> MusicResult<()> {
        self.log.lock().unwrap().stops += 1;
        Ok(())
    }

    async fn destroy(&mut self) {
        self.log.lock().unwrap().destroys += 1;
    }
}

/// A cache that only tracks which keys are "on disk".
#[derive(Clone, Default)]
pub struct FakeCache {
    ready: Arc<Mutex<HashSet<String>>>,
}

impl FakeCache {
    pub fn warm(&self, key: &str) {
        self.ready.lock().unwrap().insert(key.to_string());
    }

    fn path(key: &str) -> PathBuf {
        PathBuf::from("/cache").join(format!("{}.opus", key))
    }
}

#[async_trait]
impl CacheStore for FakeCache {
    async fn contains(&self, key: &str) -> bool {
        self.ready.lock().unwrap().contains(key)
    }

    fn target_path(&self, key: &str) -> PathBuf {
        Self::path(key)
    }

    async fn open(&self, key: &str) -> MusicResult<AudioResource> {
        if !self.ready.lock().unwrap().contains(key) {
            return Err(MusicError::AudioSourceError(format!("{} is not cached", key)));
        }
        Ok(AudioResource {
            source_id: key.to_string(),
            path: Self::path(key),
        })
    }
}

/// A download the test decides the outcome of.
pub struct PendingDownload {
    pub locator: String,
    pub key: String,
    resolve: oneshot::Sender<Result<(), DownloadError>>,
}

impl PendingDownload {
    pub fn succeed(self) {
        let _ = self.resolve.send(Ok(()));
    }

    pub fn fail(self, stderr: &str) {
        let _ = self.resolve.send(Err(DownloadError::Failed {
            code: Some(1),
            stderr: stderr.to_string(),
        }));
    }

    /// Resolves once the manager abandons the download.
    pub async fn cancelled(&mut self) {
        self.resolve.closed().await
    }
}

/// Parks every download until the test resolves it. Successful downloads
/// warm the cache like a real one would.
pub struct GatedDownloader {
    cache: FakeCache,
    pending: mpsc::UnboundedSender<PendingDownload>,
}

#[async_trait]
impl Downloader for GatedDownloader {
    async fn download(&self, locator: &str, dest: &Path) -> Result<(), DownloadError> {
        let key = dest
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let (resolve, outcome) = oneshot::channel();
        let _ = self.pending.send(PendingDownload {
            locator: locator.to_string(),
            key: key.clone(),
            resolve,
        });

        let result = outcome.await.unwrap_or_else(|_| {
            Err(DownloadError::Failed {
                code: None,
                stderr: "test dropped the download".to_string(),
            })
        });
        if result.is_ok() {
            self.cache.warm(&key);
        }
        result
    }
}

mock! {
    pub Announcer {}

    #[async_trait]
    impl Notifier for Announcer {
        async fn now_playing(&self, channel: ChannelId, item: QueueItem);
    }
}

/// A manager wired to fakes, plus the handles to drive and observe them.
pub struct Harness {
    pub manager: SongManager,
    pub voice: FakeVoice,
    pub cache: FakeCache,
    pub downloads: mpsc::UnboundedReceiver<PendingDownload>,
    pub announcements: mpsc::UnboundedReceiver<(ChannelId, QueueItem)>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let voice = FakeVoice::default();
        let cache = FakeCache::default();
        let (pending, downloads) = mpsc::unbounded_channel();
        let (announce, announcements) = mpsc::unbounded_channel();

        let mut notifier = MockAnnouncer::new();
        notifier
            .expect_now_playing()
            .returning(move |channel, item| {
                let _ = announce.send((channel, item));
            });

        let manager = SongManager::spawn(
            Backends {
                transport: Arc::new(voice.clone()),
                downloader: Arc::new(GatedDownloader {
                    cache: cache.clone(),
                    pending,
                }),
                cache: Arc::new(cache.clone()),
                notifier: Arc::new(notifier),
            },
            timeout,
        );

        Self {
            manager,
            voice,
            cache,
            downloads,
            announcements,
        }
    }

    /// A connected manager with its output channel set.
    pub async fn connected() -> Self {
        let harness = Self::new();
        harness.manager.connect(TARGET).await.unwrap();
        harness
            .manager
            .set_output_channel(TEXT_CHANNEL)
            .await
            .unwrap();
        harness
    }

    pub async fn next_download(&mut self) -> PendingDownload {
        tokio::time::timeout(Duration::from_secs(5), self.downloads.recv())
            .await
            .expect("no download was started")
            .expect("downloader is gone")
    }

    pub async fn next_announcement(&mut self) -> (ChannelId, QueueItem) {
        tokio::time::timeout(Duration::from_secs(5), self.announcements.recv())
            .await
            .expect("nothing was announced")
            .expect("notifier is gone")
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.manager.snapshot().await.unwrap()
    }

    /// Polls until the session satisfies `check`.
    pub async fn wait_for(&self, check: impl Fn(&SessionSnapshot) -> bool) -> SessionSnapshot {
        let poll = async {
            loop {
                let snapshot = self.snapshot().await;
                if check(&snapshot) {
                    return snapshot;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), poll)
            .await
            .expect("session never reached the expected state")
    }
}
