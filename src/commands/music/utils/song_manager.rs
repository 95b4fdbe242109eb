//! The playback session manager.
//!
//! One tokio task owns the [`Session`] and drains a single mailbox. Commands
//! talk to it through the cloneable [`SongManager`] handle; the voice
//! connection and the download task post their events to the same mailbox
//! through [`SessionEvents`]. Every operation is therefore applied in one
//! total order, and nothing outside the task ever touches session state.

use serenity::all::ChannelId;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backends::{
    CacheStore, ConnectionToken, DownloadError, Downloader, Notifier, TrackToken, VoiceConnection,
    VoiceTarget, VoiceTransport,
};
use super::queue_item::QueueItem;

const MAILBOX_CAPACITY: usize = 64;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Audio source error: {0}")]
    AudioSourceError(String),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("No results found for the query")]
    NoResults,

    #[error("Queue position {index} is out of range (queue has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Download failed: {0}")]
    DownloadFailed(#[from] DownloadError),

    #[error("The session was reset before playback started")]
    SessionReset,

    #[error("The song manager has stopped")]
    ManagerStopped,
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Idle,
    Downloading,
    Playing,
}

/// A point-in-time copy of the session, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: QueueStatus,
    pub queue: Vec<QueueItem>,
    pub connected: bool,
    pub paused: bool,
    pub output_channel: Option<ChannelId>,
}

impl SessionSnapshot {
    pub fn current(&self) -> Option<&QueueItem> {
        self.queue.first()
    }
}

/// Resolves once a play cycle has either started playback or failed.
#[derive(Debug)]
pub struct PlayCycle(oneshot::Receiver<MusicResult<()>>);

impl PlayCycle {
    pub async fn finished(self) -> MusicResult<()> {
        self.0.await.unwrap_or(Err(MusicError::ManagerStopped))
    }
}

/// Outcome of [`SongManager::enqueue`].
#[derive(Debug)]
pub struct Enqueued {
    /// 1-based position in the queue.
    pub position: usize,
    /// Present when the item went to the head of an empty queue.
    pub cycle: Option<PlayCycle>,
}

/// Outcome of [`SongManager::skip`] and [`SongManager::remove_at`].
#[derive(Debug)]
pub enum Removal {
    Removed {
        item: QueueItem,
        /// The cycle started for the new head, if removing the old head started one.
        next: Option<PlayCycle>,
    },
    /// Nothing to remove.
    Empty,
    /// The head is still downloading, so it was left alone.
    Downloading,
}

/// The production and test seams the manager drives.
pub struct Backends {
    pub transport: Arc<dyn VoiceTransport>,
    pub downloader: Arc<dyn Downloader>,
    pub cache: Arc<dyn CacheStore>,
    pub notifier: Arc<dyn Notifier>,
}

type Reply<T> = oneshot::Sender<T>;
type Waiter = oneshot::Sender<MusicResult<()>>;

enum Request {
    Connect { target: VoiceTarget, reply: Reply<MusicResult<bool>> },
    Disconnect { reply: Reply<()> },
    Enqueue { item: QueueItem, reply: Reply<MusicResult<Enqueued>> },
    RemoveAt { index: usize, reply: Reply<MusicResult<Removal>> },
    Skip { reply: Reply<MusicResult<Removal>> },
    Pause { reply: Reply<MusicResult<bool>> },
    Unpause { reply: Reply<MusicResult<bool>> },
    Retry { reply: Reply<MusicResult<Option<PlayCycle>>> },
    SetOutputChannel { channel: ChannelId, reply: Reply<()> },
    Snapshot { reply: Reply<SessionSnapshot> },
}

enum Message {
    Request(Request),
    TrackFinished(TrackToken),
    ConnectionLost(ConnectionToken),
    DownloadFinished {
        cycle: TrackToken,
        result: Result<(), DownloadError>,
    },
}

/// Posts external events to the session mailbox. Holds a weak sender, so it
/// never keeps a stopped manager alive.
#[derive(Clone)]
pub struct SessionEvents {
    tx: mpsc::WeakSender<Message>,
}

impl SessionEvents {
    pub async fn track_finished(&self, token: TrackToken) {
        self.post(Message::TrackFinished(token)).await;
    }

    pub async fn connection_lost(&self, token: ConnectionToken) {
        self.post(Message::ConnectionLost(token)).await;
    }

    async fn download_finished(&self, cycle: TrackToken, result: Result<(), DownloadError>) {
        self.post(Message::DownloadFinished { cycle, result }).await;
    }

    async fn post(&self, message: Message) {
        let Some(tx) = self.tx.upgrade() else {
            debug!("Song manager is gone, dropping event");
            return;
        };
        if tx.send(message).await.is_err() {
            debug!("Song manager is gone, dropping event");
        }
    }
}

/// Handle to the playback session. Cheap to clone.
#[derive(Clone)]
pub struct SongManager {
    tx: mpsc::Sender<Message>,
}

impl SongManager {
    /// Starts the session task. `download_timeout` bounds every download.
    pub fn spawn(backends: Backends, download_timeout: Option<Duration>) -> Self {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let session = Session::new(backends, download_timeout, tx.downgrade());
        tokio::spawn(session.run(rx));
        Self { tx }
    }

    /// Binds the session to a voice channel. Returns `false` if it was already connected.
    pub async fn connect(&self, target: VoiceTarget) -> MusicResult<bool> {
        self.request(|reply| Request::Connect { target, reply }).await?
    }

    /// Leaves the voice channel and clears everything. Safe to call repeatedly.
    pub async fn disconnect(&self) -> MusicResult<()> {
        self.request(|reply| Request::Disconnect { reply }).await
    }

    pub async fn enqueue(&self, item: QueueItem) -> MusicResult<Enqueued> {
        self.request(|reply| Request::Enqueue { item, reply }).await?
    }

    /// Removes the item at a 0-based index. Index 0 behaves exactly like [`Self::skip`].
    pub async fn remove_at(&self, index: usize) -> MusicResult<Removal> {
        self.request(|reply| Request::RemoveAt { index, reply }).await?
    }

    pub async fn skip(&self) -> MusicResult<Removal> {
        self.request(|reply| Request::Skip { reply }).await?
    }

    /// Returns whether a playing track was paused.
    pub async fn pause(&self) -> MusicResult<bool> {
        self.request(|reply| Request::Pause { reply }).await?
    }

    /// Returns whether a paused track was resumed.
    pub async fn unpause(&self) -> MusicResult<bool> {
        self.request(|reply| Request::Unpause { reply }).await?
    }

    /// Restarts the play cycle for a head left idle by a failed download.
    /// Returns `None` when there is nothing to retry.
    pub async fn retry(&self) -> MusicResult<Option<PlayCycle>> {
        self.request(|reply| Request::Retry { reply }).await?
    }

    /// Sets the channel "now playing" announcements go to.
    pub async fn set_output_channel(&self, channel: ChannelId) -> MusicResult<()> {
        self.request(|reply| Request::SetOutputChannel { channel, reply })
            .await
    }

    pub async fn snapshot(&self) -> MusicResult<SessionSnapshot> {
        self.request(|reply| Request::Snapshot { reply }).await
    }

    pub async fn status(&self) -> MusicResult<QueueStatus> {
        Ok(self.snapshot().await?.status)
    }

    pub async fn current(&self) -> MusicResult<Option<QueueItem>> {
        Ok(self.snapshot().await?.queue.into_iter().next())
    }

    pub async fn queue(&self) -> MusicResult<Vec<QueueItem>> {
        Ok(self.snapshot().await?.queue)
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Request) -> MusicResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Request(build(reply)))
            .await
            .map_err(|_| MusicError::ManagerStopped)?;
        rx.await.map_err(|_| MusicError::ManagerStopped)
    }
}

struct Entry {
    id: u64,
    item: QueueItem,
}

struct InFlightDownload {
    cycle: TrackToken,
    /// Queue entry the download belongs to.
    entry: u64,
    announce: bool,
    waiter: Option<Waiter>,
    task: JoinHandle<()>,
}

struct Session {
    backends: Backends,
    download_timeout: Option<Duration>,
    mailbox: mpsc::WeakSender<Message>,
    queue: VecDeque<Entry>,
    status: QueueStatus,
    connection: Option<(ConnectionToken, Box<dyn VoiceConnection>)>,
    output_channel: Option<ChannelId>,
    download: Option<InFlightDownload>,
    /// Token of the track currently handed to the player.
    loaded: Option<TrackToken>,
    paused: bool,
    next_id: u64,
}

impl Session {
    fn new(
        backends: Backends,
        download_timeout: Option<Duration>,
        mailbox: mpsc::WeakSender<Message>,
    ) -> Self {
        Self {
            backends,
            download_timeout,
            mailbox,
            queue: VecDeque::new(),
            status: QueueStatus::Idle,
            connection: None,
            output_channel: None,
            download: None,
            loaded: None,
            paused: false,
            next_id: 0,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Message>) {
        while let Some(message) = rx.recv().await {
            match message {
                Message::Request(request) => self.handle(request).await,
                Message::TrackFinished(token) => self.on_track_finished(token).await,
                Message::ConnectionLost(token) => self.on_connection_lost(token).await,
                Message::DownloadFinished { cycle, result } => {
                    self.on_download_finished(cycle, result).await
                }
            }
        }
        self.reset().await;
        debug!("Song manager stopped");
    }

    async fn handle(&mut self, request: Request) {
        // A dropped reply receiver only means the caller stopped waiting.
        match request {
            Request::Connect { target, reply } => {
                let _ = reply.send(self.connect(target).await);
            }
            Request::Disconnect { reply } => {
                self.reset().await;
                let _ = reply.send(());
            }
            Request::Enqueue { item, reply } => {
                let _ = reply.send(self.enqueue(item).await);
            }
            Request::RemoveAt { index, reply } => {
                let _ = reply.send(self.remove_at(index).await);
            }
            Request::Skip { reply } => {
                let _ = reply.send(self.skip().await);
            }
            Request::Pause { reply } => {
                let _ = reply.send(self.pause().await);
            }
            Request::Unpause { reply } => {
                let _ = reply.send(self.unpause().await);
            }
            Request::Retry { reply } => {
                let _ = reply.send(self.retry().await);
            }
            Request::SetOutputChannel { channel, reply } => {
                self.output_channel = Some(channel);
                let _ = reply.send(());
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn events(&self) -> SessionEvents {
        SessionEvents {
            tx: self.mailbox.clone(),
        }
    }

    fn ensure_connected(&self) -> MusicResult<()> {
        match self.connection {
            Some(_) => Ok(()),
            None => Err(MusicError::NotConnected),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            queue: self.queue.iter().map(|entry| entry.item.clone()).collect(),
            connected: self.connection.is_some(),
            paused: self.paused,
            output_channel: self.output_channel,
        }
    }

    async fn connect(&mut self, target: VoiceTarget) -> MusicResult<bool> {
        if self.connection.is_some() {
            debug!("Already connected, ignoring connect to {}", target.channel_id);
            return Ok(false);
        }

        let token = ConnectionToken(self.next_id());
        let connection = self
            .backends
            .transport
            .join(target, token, self.events())
            .await?;

        info!(
            "Joined voice channel {} in guild {} ({})",
            target.channel_id, target.guild_id, token
        );
        self.connection = Some((token, connection));
        Ok(true)
    }

    async fn enqueue(&mut self, item: QueueItem) -> MusicResult<Enqueued> {
        self.ensure_connected()?;

        info!("Queued '{}' ({})", item.display_title(), item.source_id);
        let id = self.next_id();
        self.queue.push_back(Entry { id, item });

        let position = self.queue.len();
        let cycle = if position == 1 {
            Some(self.start_cycle(false).await)
        } else {
            None
        };

        Ok(Enqueued { position, cycle })
    }

    async fn remove_at(&mut self, index: usize) -> MusicResult<Removal> {
        self.ensure_connected()?;

        let len = self.queue.len();
        if index >= len {
            return Err(MusicError::IndexOutOfRange { index, len });
        }
        if index == 0 {
            return self.skip().await;
        }

        let entry = self
            .queue
            .remove(index)
            .ok_or(MusicError::IndexOutOfRange { index, len })?;
        info!("Removed '{}' from position {}", entry.item.display_title(), index + 1);

        Ok(Removal::Removed {
            item: entry.item,
            next: None,
        })
    }

    async fn skip(&mut self) -> MusicResult<Removal> {
        self.ensure_connected()?;

        if self.status == QueueStatus::Downloading {
            debug!("Ignoring skip while the head is downloading");
            return Ok(Removal::Downloading);
        }
        let Some(entry) = self.queue.pop_front() else {
            return Ok(Removal::Empty);
        };

        info!("Skipped '{}'", entry.item.display_title());
        self.unload().await;
        self.status = QueueStatus::Idle;

        let next = if self.queue.is_empty() {
            None
        } else {
            Some(self.start_cycle(true).await)
        };

        Ok(Removal::Removed {
            item: entry.item,
            next,
        })
    }

    async fn pause(&mut self) -> MusicResult<bool> {
        self.ensure_connected()?;
        if self.status != QueueStatus::Playing {
            return Ok(false);
        }

        if let Some((_, connection)) = self.connection.as_mut() {
            connection.pause().await?;
        }
        self.status = QueueStatus::Idle;
        self.paused = true;
        Ok(true)
    }

    async fn unpause(&mut self) -> MusicResult<bool> {
        self.ensure_connected()?;
        if self.status != QueueStatus::Idle || !self.paused || self.loaded.is_none() {
            return Ok(false);
        }

        if let Some((_, connection)) = self.connection.as_mut() {
            connection.unpause().await?;
        }
        self.status = QueueStatus::Playing;
        self.paused = false;
        Ok(true)
    }

    async fn retry(&mut self) -> MusicResult<Option<PlayCycle>> {
        self.ensure_connected()?;
        if self.status != QueueStatus::Idle || self.loaded.is_some() || self.queue.is_empty() {
            return Ok(None);
        }

        info!("Retrying the head of the queue");
        Ok(Some(self.start_cycle(false).await))
    }

    /// Stops the player if it holds a track.
    async fn unload(&mut self) {
        self.paused = false;
        if self.loaded.take().is_none() {
            return;
        }
        if let Some((_, connection)) = self.connection.as_mut() {
            if let Err(e) = connection.stop().await {
                debug!("Failed to stop the player: {}", e);
            }
        }
    }

    async fn start_cycle(&mut self, announce: bool) -> PlayCycle {
        let (waiter, rx) = oneshot::channel();
        self.play_head(announce, Some(waiter)).await;
        PlayCycle(rx)
    }

    async fn play_head(&mut self, announce: bool, waiter: Option<Waiter>) {
        let Some((entry, key, locator)) = self
            .queue
            .front()
            .map(|head| (head.id, head.item.source_id.clone(), head.item.source_url.clone()))
        else {
            self.status = QueueStatus::Idle;
            complete(waiter, Ok(()));
            return;
        };
        let cycle = TrackToken(self.next_id());

        if self.backends.cache.contains(&key).await {
            debug!("Cache hit for {}", key);
            self.begin_playback(cycle, announce, waiter).await;
            return;
        }

        let dest = self.backends.cache.target_path(&key);
        info!("Downloading {} to {}", locator, dest.display());
        self.status = QueueStatus::Downloading;

        let downloader = Arc::clone(&self.backends.downloader);
        let timeout = self.download_timeout;
        let events = self.events();
        let task = tokio::spawn(async move {
            let download = downloader.download(&locator, &dest);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, download)
                    .await
                    .unwrap_or(Err(DownloadError::TimedOut(limit))),
                None => download.await,
            };
            events.download_finished(cycle, result).await;
        });

        self.download = Some(InFlightDownload {
            cycle,
            entry,
            announce,
            waiter,
            task,
        });
    }

    async fn on_download_finished(&mut self, cycle: TrackToken, result: Result<(), DownloadError>) {
        let Some(download) = self.download.take_if(|download| download.cycle == cycle) else {
            debug!("Ignoring stale download result for {}", cycle);
            return;
        };

        if !self.queue.front().is_some_and(|head| head.id == download.entry) {
            debug!("Head changed while {} was downloading", cycle);
            self.status = QueueStatus::Idle;
            complete(download.waiter, Err(MusicError::SessionReset));
            return;
        }

        match result {
            Ok(()) => {
                self.begin_playback(cycle, download.announce, download.waiter)
                    .await
            }
            Err(e) => {
                self.status = QueueStatus::Idle;
                complete(download.waiter, Err(MusicError::DownloadFailed(e)));
            }
        }
    }

    async fn begin_playback(&mut self, cycle: TrackToken, announce: bool, waiter: Option<Waiter>) {
        let result = self.load_head(cycle).await;
        match &result {
            Ok(item) => {
                if announce {
                    self.announce(item.clone());
                }
            }
            Err(_) => self.status = QueueStatus::Idle,
        }
        complete(waiter, result.map(|_| ()));
    }

    async fn load_head(&mut self, cycle: TrackToken) -> MusicResult<QueueItem> {
        let item = self
            .queue
            .front()
            .map(|head| head.item.clone())
            .ok_or(MusicError::SessionReset)?;
        let resource = self.backends.cache.open(&item.source_id).await?;
        let (_, connection) = self.connection.as_mut().ok_or(MusicError::NotConnected)?;
        connection.play(resource, cycle).await?;

        info!("Now playing '{}' ({})", item.display_title(), cycle);
        self.status = QueueStatus::Playing;
        self.loaded = Some(cycle);
        self.paused = false;
        Ok(item)
    }

    fn announce(&self, item: QueueItem) {
        let Some(channel) = self.output_channel else {
            return;
        };
        let notifier = Arc::clone(&self.backends.notifier);
        tokio::spawn(async move { notifier.now_playing(channel, item).await });
    }

    async fn on_track_finished(&mut self, token: TrackToken) {
        if self.loaded != Some(token) {
            debug!("Ignoring finish event for stale {}", token);
            return;
        }

        self.loaded = None;
        self.paused = false;
        self.status = QueueStatus::Idle;
        if let Some(finished) = self.queue.pop_front() {
            info!("Finished playing '{}'", finished.item.display_title());
        }

        if !self.queue.is_empty() {
            self.play_head(true, None).await;
        }
    }

    async fn on_connection_lost(&mut self, token: ConnectionToken) {
        if !self.connection.as_ref().is_some_and(|(current, _)| *current == token) {
            debug!("Ignoring loss of stale {}", token);
            return;
        }

        warn!("Voice connection lost, resetting the session");
        self.reset().await;
    }

    /// Returns the session to its pristine state: no connection, no queue, no download.
    async fn reset(&mut self) {
        if let Some(download) = self.download.take() {
            download.task.abort();
            complete(download.waiter, Err(MusicError::SessionReset));
            info!("Cancelled in-flight download for {}", download.cycle);
        }
        if let Some((token, mut connection)) = self.connection.take() {
            connection.destroy().await;
            info!("Left voice channel ({})", token);
        }

        self.queue.clear();
        self.status = QueueStatus::Idle;
        self.loaded = None;
        self.paused = false;
        self.output_channel = None;
    }
}

/// Hands a cycle outcome to whoever is waiting on it. Failures nobody waits
/// for are logged instead.
fn complete(waiter: Option<Waiter>, result: MusicResult<()>) {
    if let Err(e) = &result {
        warn!("Play cycle failed: {}", e);
    }
    if let Some(waiter) = waiter {
        let _ = waiter.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::music::utils::backends::{AudioResource, MockDownloader};
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serenity::all::GuildId;
    use serenity::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        played: Arc<Mutex<Vec<String>>>,
    }

    struct RecordingConnection {
        played: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl VoiceTransport for RecordingTransport {
        async fn join(
            &self,
            _target: VoiceTarget,
            _token: ConnectionToken,
            _events: SessionEvents,
        ) -> MusicResult<Box<dyn VoiceConnection>> {
            Ok(Box::new(RecordingConnection {
                played: Arc::clone(&self.played),
            }))
        }
    }

    #[async_trait]
    impl VoiceConnection for RecordingConnection {
        async fn play(&mut self, resource: AudioResource, _token: TrackToken) -> MusicResult<()> {
            self.played.lock().unwrap().push(resource.source_id);
            Ok(())
        }
        async fn pause(&mut self) -> MusicResult<()> {
            Ok(())
        }
        async fn unpause(&mut self) -> MusicResult<()> {
            Ok(())
        }
        async fn stop(&mut self) -> MusicResult<()> {
            Ok(())
        }
        async fn destroy(&mut self) {}
    }

    /// Every key is cached.
    struct WarmCache;

    #[async_trait]
    impl CacheStore for WarmCache {
        async fn contains(&self, _key: &str) -> bool {
            true
        }
        fn target_path(&self, key: &str) -> PathBuf {
            PathBuf::from(format!("/cache/{key}.opus"))
        }
        async fn open(&self, key: &str) -> MusicResult<AudioResource> {
            Ok(AudioResource {
                source_id: key.to_string(),
                path: self.target_path(key),
            })
        }
    }

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        async fn now_playing(&self, _channel: ChannelId, _item: QueueItem) {}
    }

    fn target() -> VoiceTarget {
        VoiceTarget {
            guild_id: GuildId::new(1),
            channel_id: ChannelId::new(2),
        }
    }

    fn manager(transport: RecordingTransport, downloader: MockDownloader) -> SongManager {
        SongManager::spawn(
            Backends {
                transport: Arc::new(transport),
                downloader: Arc::new(downloader),
                cache: Arc::new(WarmCache),
                notifier: Arc::new(SilentNotifier),
            },
            None,
        )
    }

    fn item(id: &str) -> QueueItem {
        QueueItem::new(id, format!("https://www.youtube.com/watch?v={id}"))
    }

    #[tokio::test]
    async fn cached_items_play_without_downloading() {
        let mut downloader = MockDownloader::new();
        downloader.expect_download().never();
        let transport = RecordingTransport::default();
        let played = Arc::clone(&transport.played);
        let songs = manager(transport, downloader);

        assert!(songs.connect(target()).await.unwrap());
        let enqueued = songs.enqueue(item("a")).await.unwrap();

        assert_eq!(enqueued.position, 1);
        enqueued.cycle.unwrap().finished().await.unwrap();
        assert_eq!(songs.status().await.unwrap(), QueueStatus::Playing);
        assert_eq!(*played.lock().unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn queue_operations_require_a_connection() {
        let songs = manager(RecordingTransport::default(), MockDownloader::new());

        assert_matches!(songs.enqueue(item("a")).await, Err(MusicError::NotConnected));
        assert_matches!(songs.skip().await, Err(MusicError::NotConnected));
        assert_matches!(songs.pause().await, Err(MusicError::NotConnected));
        assert_matches!(songs.remove_at(0).await, Err(MusicError::NotConnected));
        assert!(songs.queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let songs = manager(RecordingTransport::default(), MockDownloader::new());

        assert!(songs.connect(target()).await.unwrap());
        assert!(!songs.connect(target()).await.unwrap());
        assert!(songs.snapshot().await.unwrap().connected);
    }

    #[tokio::test]
    async fn remove_out_of_range_is_a_structured_error() {
        let songs = manager(RecordingTransport::default(), MockDownloader::new());
        songs.connect(target()).await.unwrap();
        songs.enqueue(item("a")).await.unwrap();

        assert_matches!(
            songs.remove_at(3).await,
            Err(MusicError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[tokio::test]
    async fn dropped_cycle_reports_manager_stopped() {
        let (tx, rx) = oneshot::channel::<MusicResult<()>>();
        drop(tx);
        assert_matches!(PlayCycle(rx).finished().await, Err(MusicError::ManagerStopped));
    }
}
