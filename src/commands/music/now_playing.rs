use super::utils::embedded_messages::{self, BLUE};
use super::voice_target;
use crate::{CommandResult, Context};

/// Show details about the song currently playing.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn nowplaying(ctx: Context<'_>) -> CommandResult {
    if voice_target(ctx).await?.is_none() {
        return Ok(());
    }

    let reply = match ctx.data().songs.current().await? {
        Some(item) => embedded_messages::track(&item, "Now Playing", BLUE),
        None => embedded_messages::nothing_playing(),
    };
    ctx.send(reply).await?;
    Ok(())
}
