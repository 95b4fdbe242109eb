use super::utils::{
    embedded_messages::{self, DARK_GREEN},
    song_manager::Removal,
};
use super::{reply_error, report_cycle, voice_target};
use crate::{CommandResult, Context};

/// Remove a song from the queue.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "The number of the item to remove"]
    #[min = 1]
    index: usize,
) -> CommandResult {
    if voice_target(ctx).await?.is_none() {
        return Ok(());
    }

    match ctx.data().songs.remove_at(index.saturating_sub(1)).await {
        Ok(Removal::Removed { item, next }) => {
            ctx.send(embedded_messages::track(
                &item,
                "✂️ Removed from Queue",
                DARK_GREEN,
            ))
            .await?;
            if let Some(next) = next {
                report_cycle(ctx, next).await?;
            }
        }
        Ok(Removal::Empty) => {
            ctx.send(embedded_messages::invalid_queue_position()).await?;
        }
        Ok(Removal::Downloading) => {
            ctx.send(embedded_messages::still_downloading()).await?;
        }
        Err(e) => return reply_error(ctx, e).await,
    }
    Ok(())
}
