//! Production seams for the song manager: songbird for voice, serenity HTTP
//! for "now playing" messages.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::{ChannelId, CreateMessage, GuildId, Http};
use songbird::input::{File, Input};
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Call, CoreEvent, Event, EventContext, Songbird, TrackEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::backends::{
    AudioResource, ConnectionToken, Notifier, TrackToken, VoiceConnection, VoiceTarget,
    VoiceTransport,
};
use super::embedded_messages;
use super::queue_item::QueueItem;
use super::song_manager::{MusicError, MusicResult, SessionEvents};

pub struct SongbirdTransport {
    songbird: Arc<Songbird>,
}

impl SongbirdTransport {
    pub fn new(songbird: Arc<Songbird>) -> Self {
        Self { songbird }
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn join(
        &self,
        target: VoiceTarget,
        token: ConnectionToken,
        events: SessionEvents,
    ) -> MusicResult<Box<dyn VoiceConnection>> {
        let call = self
            .songbird
            .join(target.guild_id, target.channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;

        {
            let mut handler = call.lock().await;
            // A call reused from an earlier session may still carry that session's listener.
            handler.remove_all_global_events();
            handler.add_global_event(
                Event::Core(CoreEvent::DriverDisconnect),
                DisconnectNotifier {
                    events: events.clone(),
                    token,
                },
            );
        }

        Ok(Box::new(SongbirdConnection {
            songbird: Arc::clone(&self.songbird),
            guild_id: target.guild_id,
            call,
            track: None,
            events,
        }))
    }
}

pub struct SongbirdConnection {
    songbird: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    track: Option<TrackHandle>,
    events: SessionEvents,
}

impl SongbirdConnection {
    fn track(&self) -> MusicResult<&TrackHandle> {
        self.track
            .as_ref()
            .ok_or_else(|| MusicError::PlaybackError("No track loaded".to_string()))
    }
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    async fn play(&mut self, resource: AudioResource, token: TrackToken) -> MusicResult<()> {
        let input: Input = File::new(resource.path).into();
        let handle = {
            let mut call = self.call.lock().await;
            call.stop();
            call.play_input(input)
        };

        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    TrackEndNotifier {
                        events: self.events.clone(),
                        token,
                    },
                )
                .map_err(|e| MusicError::PlaybackError(e.to_string()))?;
        }

        self.track = Some(handle);
        Ok(())
    }

    async fn pause(&mut self) -> MusicResult<()> {
        self.track()?
            .pause()
            .map_err(|e| MusicError::PlaybackError(e.to_string()))
    }

    async fn unpause(&mut self) -> MusicResult<()> {
        self.track()?
            .play()
            .map_err(|e| MusicError::PlaybackError(e.to_string()))
    }

    async fn stop(&mut self) -> MusicResult<()> {
        match self.track.take() {
            // An already finished track can't be stopped, which is fine.
            Some(track) => {
                if let Err(e) = track.stop() {
                    debug!("Track was already stopped: {}", e);
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn destroy(&mut self) {
        if let Some(track) = self.track.take() {
            let _ = track.stop();
        }
        {
            let mut call = self.call.lock().await;
            call.remove_all_global_events();
        }
        match self.songbird.remove(self.guild_id).await {
            Ok(()) => info!("Left voice in guild {}", self.guild_id),
            Err(e) => debug!("Voice for guild {} was already gone: {}", self.guild_id, e),
        }
    }
}

/// Reports the end of one track, natural or not, to the session.
struct TrackEndNotifier {
    events: SessionEvents,
    token: TrackToken,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            for (state, _) in tracks.iter() {
                if let PlayMode::Errored(e) = &state.playing {
                    warn!("Player error on {}: {:?}", self.token, e);
                }
            }
            self.events.track_finished(self.token).await;
        }
        Some(Event::Cancel)
    }
}

/// Resets the session when the driver drops the connection.
struct DisconnectNotifier {
    events: SessionEvents,
    token: ConnectionToken,
}

#[async_trait]
impl songbird::EventHandler for DisconnectNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(data) = ctx {
            warn!(
                "Voice driver disconnected ({:?}, reason {:?})",
                data.kind, data.reason
            );
            self.events.connection_lost(self.token).await;
            return Some(Event::Cancel);
        }
        None
    }
}

/// Posts "now playing" embeds through the bot's HTTP client.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn now_playing(&self, channel: ChannelId, item: QueueItem) {
        let message = CreateMessage::new().embed(embedded_messages::track_embed(
            &item,
            "▶️ Now Playing",
            embedded_messages::BLUE,
        ));
        if let Err(e) = channel.send_message(&self.http, message).await {
            warn!("Failed to announce '{}' in {}: {}", item.display_title(), channel, e);
        }
    }
}
