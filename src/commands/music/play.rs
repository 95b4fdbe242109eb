use chrono::Utc;
use tracing::info;

use super::utils::{embedded_messages, queue_item::Requester, song_manager::MusicError};
use super::{add_to_queue, reply_error, voice_target};
use crate::{CommandResult, Context};

/// Add a song to the queue.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "The search query or a video URL"] query: String,
) -> CommandResult {
    let Some(target) = voice_target(ctx).await? else {
        return Ok(());
    };
    info!("Received play command with query: {}", query);

    let item = match ctx.data().search.search(&query, 1).await {
        Ok(items) => items.into_iter().next(),
        Err(MusicError::NoResults) => None,
        Err(e) => return reply_error(ctx, e).await,
    };
    let Some(item) = item else {
        ctx.send(embedded_messages::no_results(&query)).await?;
        return Ok(());
    };

    let item = item.requested(Requester::from(ctx.author()), Utc::now());
    add_to_queue(ctx, target, item).await
}
