pub(crate) mod now_playing;
pub(crate) mod pause;
pub(crate) mod play;
pub(crate) mod queue;
pub(crate) mod remove;
pub(crate) mod retry;
pub(crate) mod search;
pub(crate) mod skip;
pub(crate) mod stop;

pub mod utils;

use crate::{CommandResult, Context, Error};
use poise::serenity_prelude as serenity;
use serenity::{ChannelId, GuildId, UserId};
use tracing::{info, warn};

use now_playing::nowplaying;
use pause::{pause, unpause};
use play::play;
use queue::queue;
use remove::remove;
use retry::retry;
use search::search;
use skip::skip;
use stop::stop;
use utils::{
    backends::VoiceTarget,
    embedded_messages,
    queue_item::QueueItem,
    song_manager::{MusicError, MusicResult, PlayCycle},
};

/// Commands for playing music. Must be in a voice channel to use.
#[poise::command(
    slash_command,
    guild_only,
    category = "Music",
    subcommands(
        "search",
        "play",
        "queue",
        "nowplaying",
        "pause",
        "unpause",
        "skip",
        "remove",
        "retry",
        "stop"
    ),
    subcommand_required
)]
pub async fn song(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Looks up the voice channel a member is sitting in.
pub fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: UserId,
) -> MusicResult<ChannelId> {
    let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(MusicError::UserNotInVoiceChannel)
}

/// Every `/song` subcommand starts here: the invoker must be in a voice
/// channel, and the invoking text channel becomes the notification channel.
/// Replies and returns `None` when the invoker isn't in voice.
async fn voice_target(ctx: Context<'_>) -> Result<Option<VoiceTarget>, Error> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    let channel_id = match user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id) {
        Ok(channel_id) => channel_id,
        Err(_) => {
            ctx.send(embedded_messages::cant_use_command()).await?;
            return Ok(None);
        }
    };

    // The rest may wait on yt-dlp, well past the interaction deadline.
    ctx.defer().await?;
    ctx.data().songs.set_output_channel(ctx.channel_id()).await?;

    Ok(Some(VoiceTarget {
        guild_id,
        channel_id,
    }))
}

/// Joins the target channel if needed, queues the item and reports the
/// outcome, including a failed download of a new head.
async fn add_to_queue(ctx: Context<'_>, target: VoiceTarget, item: QueueItem) -> CommandResult {
    let songs = &ctx.data().songs;

    if let Err(e) = songs.connect(target).await {
        warn!("Failed to join {}: {}", target.channel_id, e);
        ctx.send(embedded_messages::music_error(&e)).await?;
        return Ok(());
    }

    let enqueued = songs.enqueue(item.clone()).await?;
    info!(
        "{} queued '{}' at position {}",
        ctx.author().name,
        item.display_title(),
        enqueued.position
    );
    ctx.send(embedded_messages::added_to_queue(&item, enqueued.position))
        .await?;

    if let Some(cycle) = enqueued.cycle {
        report_cycle(ctx, cycle).await?;
    }
    Ok(())
}

/// Waits for a play cycle and tells the channel if it failed. Returns
/// whether playback started.
async fn report_cycle(ctx: Context<'_>, cycle: PlayCycle) -> Result<bool, Error> {
    match cycle.finished().await {
        Ok(()) => Ok(true),
        Err(MusicError::SessionReset) => Ok(false),
        Err(e) => {
            let current = ctx.data().songs.current().await?;
            ctx.send(embedded_messages::download_failed(current.as_ref(), &e))
                .await?;
            Ok(false)
        }
    }
}

/// Renders manager errors that a user can cause.
async fn reply_error(ctx: Context<'_>, err: MusicError) -> CommandResult {
    match err {
        MusicError::NotConnected => {
            ctx.send(embedded_messages::nothing_playing()).await?;
            Ok(())
        }
        MusicError::IndexOutOfRange { .. } => {
            ctx.send(embedded_messages::invalid_queue_position()).await?;
            Ok(())
        }
        MusicError::ManagerStopped => Err(err.into()),
        err => {
            ctx.send(embedded_messages::music_error(&err)).await?;
            Ok(())
        }
    }
}
