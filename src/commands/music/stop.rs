use tracing::info;

use super::utils::embedded_messages;
use super::voice_target;
use crate::{CommandResult, Context};

/// Clear the queue and leave the voice channel.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    if voice_target(ctx).await?.is_none() {
        return Ok(());
    }

    ctx.data().songs.disconnect().await?;
    info!("{} stopped playback", ctx.author().name);
    ctx.send(embedded_messages::so_long()).await?;
    Ok(())
}
