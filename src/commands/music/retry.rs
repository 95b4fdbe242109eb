use super::utils::embedded_messages::{self, BLUE, DARK_GREEN};
use super::{reply_error, report_cycle, voice_target};
use crate::{CommandResult, Context};

/// Retry downloading the song at the front of the queue.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn retry(ctx: Context<'_>) -> CommandResult {
    if voice_target(ctx).await?.is_none() {
        return Ok(());
    }

    let songs = &ctx.data().songs;
    let cycle = match songs.retry().await {
        Ok(Some(cycle)) => cycle,
        Ok(None) => {
            ctx.send(embedded_messages::simple(
                "Nothing to retry",
                Some("The current song isn't stuck."),
                BLUE,
            ))
            .await?;
            return Ok(());
        }
        Err(e) => return reply_error(ctx, e).await,
    };

    ctx.send(embedded_messages::simple("🔁 Retrying download...", None, BLUE))
        .await?;
    if report_cycle(ctx, cycle).await? {
        if let Some(item) = songs.current().await? {
            ctx.send(embedded_messages::track(&item, "▶️ Now Playing", DARK_GREEN))
                .await?;
        }
    }
    Ok(())
}
