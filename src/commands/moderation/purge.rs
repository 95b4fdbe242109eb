use poise::serenity_prelude as serenity;
use serenity::{
    ComponentInteractionCollector, CreateInteractionResponse, CreateMessage, GetMessages, Message,
};
use std::time::Duration;
use tracing::{debug, info};

use super::embeds;
use super::log_to_mod_channel;
use crate::commands::music::utils::embedded_messages::RED;
use crate::{CommandResult, Context};

const CONFIRM_WINDOW: Duration = Duration::from_secs(30);

/// Whether purged messages get copied to the log one by one. A single
/// deletion already shows up through the message-delete log, and purging the
/// log channel itself shouldn't refill it.
pub fn copies_to_log(requested: bool, purged: usize, in_log_channel: bool) -> bool {
    requested && purged > 1 && !in_log_channel
}

fn attachment_names(message: &Message) -> Vec<String> {
    message
        .attachments
        .iter()
        .map(|attachment| attachment.filename.clone())
        .collect()
}

/// Purge messages from the current channel.
#[poise::command(
    slash_command,
    guild_only,
    category = "Moderation",
    default_member_permissions = "MANAGE_MESSAGES",
    required_permissions = "MANAGE_MESSAGES",
    required_bot_permissions = "MANAGE_MESSAGES",
    user_cooldown = 30
)]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "The number of messages to purge"]
    #[min = 1]
    #[max = 100]
    count: u8,
    #[description = "Whether to log the deleted messages (defaults to True)"] log: Option<bool>,
) -> CommandResult {
    ctx.defer_ephemeral().await?;
    let channel = ctx.channel_id();
    let messages = channel
        .messages(ctx, GetMessages::new().limit(count))
        .await?;
    if messages.is_empty() {
        ctx.send(embeds::failure("Nothing to purge", "This channel has no messages."))
            .await?;
        return Ok(());
    }

    let purged = messages.len();
    let label = format!("Delete {} {}", purged, if purged == 1 { "Message" } else { "Messages" });
    let prefix = format!("{}_", ctx.id());
    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(embeds::confirm_purge(purged, channel))
                .components(embeds::confirm_buttons(&prefix, &label, false))
                .ephemeral(true),
        )
        .await?;

    let filter_prefix = prefix.clone();
    let press = ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(channel)
        .timeout(CONFIRM_WINDOW)
        .filter(move |press| press.data.custom_id.starts_with(&filter_prefix))
        .await;

    let Some(press) = press else {
        debug!("Purge in {} timed out", channel);
        reply
            .edit(
                ctx,
                poise::CreateReply::default()
                    .embed(embeds::confirm_purge(purged, channel))
                    .components(embeds::confirm_buttons(&prefix, &label, true)),
            )
            .await?;
        return Ok(());
    };
    press
        .create_response(ctx, CreateInteractionResponse::Acknowledge)
        .await?;

    if press.data.custom_id != format!("{}confirm", prefix) {
        reply
            .edit(
                ctx,
                poise::CreateReply::default()
                    .embed(serenity::CreateEmbed::new().title("❌ Purge canceled").color(RED))
                    .components(embeds::confirm_buttons(&prefix, &label, true)),
            )
            .await?;
        return Ok(());
    }

    channel
        .delete_messages(ctx, messages.iter().map(|message| message.id))
        .await?;
    info!("{} purged {} messages from {}", ctx.author().name, purged, channel);

    reply
        .edit(
            ctx,
            poise::CreateReply::default()
                .embed(embeds::success(
                    "Messages purged",
                    format!(
                        "Successfully deleted {} from <#{}>.",
                        embeds::message_count(purged),
                        channel
                    ),
                ))
                .components(embeds::confirm_buttons(&prefix, &label, true)),
        )
        .await?;

    let log_channel = ctx.data().config.moderation_log_channel_id;
    if copies_to_log(log.unwrap_or(true), purged, log_channel == Some(channel)) {
        // Oldest first, the way they were posted.
        for message in messages.iter().rev().filter(|message| !message.author.bot) {
            log_to_mod_channel(
                ctx,
                log_channel,
                CreateMessage::new().embed(embeds::message_deleted(
                    &message.author,
                    channel,
                    &message.content,
                    &attachment_names(message),
                )),
            )
            .await;
        }
    }
    log_to_mod_channel(
        ctx,
        log_channel,
        CreateMessage::new().embed(embeds::purge_log(purged, channel, ctx.author().id)),
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::many(true, 10, false, true)]
    #[case::opted_out(false, 10, false, false)]
    #[case::single(true, 1, false, false)]
    #[case::log_channel(true, 10, true, false)]
    fn copying_purged_messages(
        #[case] requested: bool,
        #[case] purged: usize,
        #[case] in_log_channel: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(copies_to_log(requested, purged, in_log_channel), expected);
    }
}
