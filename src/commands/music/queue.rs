use super::utils::embedded_messages;
use super::voice_target;
use crate::{CommandResult, Context};

/// Show a list of songs currently in the queue.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    if voice_target(ctx).await?.is_none() {
        return Ok(());
    }

    let snapshot = ctx.data().songs.snapshot().await?;
    ctx.send(embedded_messages::music_queue(&snapshot)).await?;
    Ok(())
}
