use poise::CreateReply;

use super::utils::{
    embedded_messages::{self, DARK_GREEN, RED},
    song_manager::{QueueStatus, SessionSnapshot},
};
use super::{reply_error, voice_target};
use crate::{CommandResult, Context};

/// What to say when pause/unpause didn't take effect.
fn not_applied(snapshot: &SessionSnapshot, action: &str) -> CreateReply {
    if snapshot.status == QueueStatus::Downloading {
        embedded_messages::still_downloading()
    } else if snapshot.current().is_none() {
        embedded_messages::nothing_playing()
    } else {
        embedded_messages::simple(format!("❌ Nothing to {}", action), None, RED)
    }
}

/// Pause the song that's currently playing.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    if voice_target(ctx).await?.is_none() {
        return Ok(());
    }

    let songs = &ctx.data().songs;
    let paused = match songs.pause().await {
        Ok(paused) => paused,
        Err(e) => return reply_error(ctx, e).await,
    };
    let snapshot = songs.snapshot().await?;

    let reply = match (paused, snapshot.current()) {
        (true, Some(item)) => embedded_messages::track(item, "⏸️ Paused", DARK_GREEN),
        _ => not_applied(&snapshot, "pause"),
    };
    ctx.send(reply).await?;
    Ok(())
}

/// Unpause the current song.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn unpause(ctx: Context<'_>) -> CommandResult {
    if voice_target(ctx).await?.is_none() {
        return Ok(());
    }

    let songs = &ctx.data().songs;
    let resumed = match songs.unpause().await {
        Ok(resumed) => resumed,
        Err(e) => return reply_error(ctx, e).await,
    };
    let snapshot = songs.snapshot().await?;

    let reply = match (resumed, snapshot.current()) {
        (true, Some(item)) => embedded_messages::track(item, "▶️ Now Playing", DARK_GREEN),
        _ => not_applied(&snapshot, "unpause"),
    };
    ctx.send(reply).await?;
    Ok(())
}
