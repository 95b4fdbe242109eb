use super::utils::{
    embedded_messages::{self, DARK_GREEN},
    song_manager::Removal,
};
use super::{reply_error, report_cycle, voice_target};
use crate::{CommandResult, Context};

/// Skip the song that's currently playing.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    if voice_target(ctx).await?.is_none() {
        return Ok(());
    }

    match ctx.data().songs.skip().await {
        Ok(Removal::Removed { item, next }) => {
            ctx.send(embedded_messages::track(&item, "⏩ Skipped", DARK_GREEN))
                .await?;
            if let Some(next) = next {
                report_cycle(ctx, next).await?;
            }
        }
        Ok(Removal::Empty) => {
            ctx.send(embedded_messages::nothing_playing()).await?;
        }
        Ok(Removal::Downloading) => {
            ctx.send(embedded_messages::still_downloading()).await?;
        }
        Err(e) => return reply_error(ctx, e).await,
    }
    Ok(())
}
