use chrono::Utc;
use poise::serenity_prelude as serenity;
use serenity::{ComponentInteractionCollector, CreateInteractionResponse};
use std::time::Duration;
use tracing::debug;

use super::utils::{
    embedded_messages::{self, RED},
    queue_item::Requester,
    song_manager::MusicError,
};
use super::{add_to_queue, reply_error, voice_target};
use crate::{CommandResult, Context};

const MAX_RESULTS: usize = 5;
const SELECTION_WINDOW: Duration = Duration::from_secs(120);

/// Search for a song.
#[poise::command(slash_command, guild_only, category = "Music", user_cooldown = 5)]
pub async fn search(
    ctx: Context<'_>,
    #[description = "The search query"] query: String,
) -> CommandResult {
    let Some(target) = voice_target(ctx).await? else {
        return Ok(());
    };

    let items = match ctx.data().search.search(&query, MAX_RESULTS).await {
        Ok(items) => items,
        Err(MusicError::NoResults) => Vec::new(),
        Err(e) => return reply_error(ctx, e).await,
    };
    if items.is_empty() {
        ctx.send(embedded_messages::no_results(&query)).await?;
        return Ok(());
    }

    let prefix = format!("{}_", ctx.id());
    let reply = ctx
        .send(embedded_messages::search_results(&query, &items, &prefix, false))
        .await?;

    let filter_prefix = prefix.clone();
    let press = ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(SELECTION_WINDOW)
        .filter(move |press| press.data.custom_id.starts_with(&filter_prefix))
        .await;

    // One selection per search, whether or not anyone picked.
    reply
        .edit(
            ctx,
            embedded_messages::search_results(&query, &items, &prefix, true),
        )
        .await?;

    let Some(press) = press else {
        debug!("Search selection for '{}' timed out", query);
        return Ok(());
    };
    press
        .create_response(ctx, CreateInteractionResponse::Acknowledge)
        .await?;

    let selection = press
        .data
        .custom_id
        .strip_prefix(&prefix)
        .and_then(|index| index.parse::<usize>().ok())
        .and_then(|index| items.get(index));
    let Some(item) = selection else {
        ctx.send(embedded_messages::simple("❌ Unable to make selection", None, RED))
            .await?;
        return Ok(());
    };

    let item = item
        .clone()
        .requested(Requester::from(&press.user), Utc::now());
    add_to_queue(ctx, target, item).await
}
