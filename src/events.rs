//! Gateway events the bot reacts to outside of commands.

use chrono::Utc;
use poise::serenity_prelude as serenity;
use serenity::{
    ChannelId, CreateMessage, FullEvent, GuildId, Message, MessageId, UserId, VoiceState,
};
use std::time::Instant;
use tracing::{debug, info};

use crate::commands::leaderboard::{embeds, standing};
use crate::commands::moderation::{embeds as mod_embeds, log_to_mod_channel};
use crate::utils::database::XpAward;
use crate::utils::xp::{self, MESSAGE_XP};
use crate::{Data, Error};

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            info!("{} is connected!", data_about_bot.user.name);
        }
        FullEvent::VoiceStateUpdate { old, new } => {
            voice_state_update(ctx, old.as_ref(), new, data).await?;
        }
        FullEvent::Message { new_message } => {
            award_message_xp(ctx, new_message, data).await?;
        }
        FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id,
        } => {
            log_deleted_message(ctx, *channel_id, *deleted_message_id, *guild_id, data).await;
        }
        FullEvent::MessageUpdate {
            old_if_available,
            new,
            ..
        } => {
            log_edited_message(ctx, old_if_available.as_ref(), new.as_ref(), data).await;
        }
        _ => {}
    }
    Ok(())
}

/// Whether `bot` sits in `channel` with nobody else.
fn left_alone(
    bot: UserId,
    channel: ChannelId,
    states: impl IntoIterator<Item = (UserId, Option<ChannelId>)>,
) -> bool {
    let mut bot_present = false;
    for (user, user_channel) in states {
        if user_channel != Some(channel) {
            continue;
        }
        if user != bot {
            return false;
        }
        bot_present = true;
    }
    bot_present
}

/// Leaves voice once the last listener walks out of the bot's channel.
async fn voice_state_update(
    ctx: &serenity::Context,
    old: Option<&VoiceState>,
    new: &VoiceState,
    data: &Data,
) -> Result<(), Error> {
    let (Some(guild_id), Some(channel)) = (new.guild_id, old.and_then(|old| old.channel_id)) else {
        return Ok(());
    };
    if new.channel_id == Some(channel) {
        return Ok(());
    }

    if !bot_left_alone(ctx, guild_id, channel) {
        return Ok(());
    }

    info!("Everyone left {}, leaving voice", channel);
    data.songs.disconnect().await?;
    Ok(())
}

fn bot_left_alone(ctx: &serenity::Context, guild_id: GuildId, channel: ChannelId) -> bool {
    let bot = ctx.cache.current_user().id;
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return false;
    };
    left_alone(
        bot,
        channel,
        guild
            .voice_states
            .iter()
            .map(|(user, state)| (*user, state.channel_id)),
    )
}

/// Guild messages count when no main guild is configured, or when they come from it.
fn in_main_guild(data: &Data, guild_id: Option<GuildId>) -> bool {
    match (guild_id, data.config.main_guild_id) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(guild_id), Some(main_guild)) => guild_id == main_guild,
    }
}

/// The level to announce for an award, if any. Newcomers and users who
/// turned notifications off never get one.
fn announced_level(award: &XpAward) -> Option<u32> {
    if !award.existed || !award.level_notifs {
        return None;
    }
    let level = xp::level_for_xp(award.new_xp);
    (level > xp::level_for_xp(award.old_xp)).then_some(level)
}

async fn award_message_xp(
    ctx: &serenity::Context,
    message: &Message,
    data: &Data,
) -> Result<(), Error> {
    if message.author.bot || !in_main_guild(data, message.guild_id) {
        return Ok(());
    }
    if !data.xp_cooldown.try_claim(message.author.id, Instant::now()) {
        return Ok(());
    }

    let award = data
        .database
        .award_xp(message.author.id, MESSAGE_XP, Utc::now())?;
    debug!(
        "{} earned {} XP ({} total)",
        message.author.name, MESSAGE_XP, award.new_xp
    );

    let Some(level) = announced_level(&award) else {
        return Ok(());
    };
    info!("{} reached level {}", message.author.name, level);

    let standing = standing(&data.database, award.new_xp)?;
    let channel = data
        .config
        .leveling_channel_id
        .unwrap_or(message.channel_id);
    channel
        .send_message(
            ctx,
            CreateMessage::new()
                .content(format!("<@{}>", message.author.id))
                .embed(embeds::level_up(message.author.id, &standing)),
        )
        .await?;
    Ok(())
}

/// Only real content changes are worth an edit log; embeds resolving also
/// fire updates.
fn edit_worth_logging(old: &str, new: &str) -> bool {
    !new.is_empty() && old != new
}

/// Copies a deleted message to the moderation log. Only messages still in
/// the cache can be shown.
async fn log_deleted_message(
    ctx: &serenity::Context,
    channel_id: ChannelId,
    message_id: MessageId,
    guild_id: Option<GuildId>,
    data: &Data,
) {
    let log_channel = data.config.moderation_log_channel_id;
    if log_channel.is_none() || !in_main_guild(data, guild_id) {
        return;
    }
    let Some(message) = ctx
        .cache
        .message(channel_id, message_id)
        .map(|message| message.clone())
    else {
        debug!("Deleted message {} wasn't cached", message_id);
        return;
    };
    if message.author.bot {
        return;
    }

    let attachments: Vec<String> = message
        .attachments
        .iter()
        .map(|attachment| attachment.filename.clone())
        .collect();
    if message.content.is_empty() && attachments.is_empty() {
        return;
    }

    log_to_mod_channel(
        ctx,
        log_channel,
        CreateMessage::new().embed(mod_embeds::message_deleted(
            &message.author,
            channel_id,
            &message.content,
            &attachments,
        )),
    )
    .await;
}

async fn log_edited_message(
    ctx: &serenity::Context,
    old: Option<&Message>,
    new: Option<&Message>,
    data: &Data,
) {
    let log_channel = data.config.moderation_log_channel_id;
    let (Some(old), Some(new)) = (old, new) else {
        return;
    };
    if log_channel.is_none() || new.author.bot || !in_main_guild(data, new.guild_id) {
        return;
    }
    if !edit_worth_logging(&old.content, &new.content) {
        return;
    }

    let link = match new.guild_id {
        Some(guild_id) => mod_embeds::message_link(guild_id, new.channel_id, new.id),
        None => return,
    };
    log_to_mod_channel(
        ctx,
        log_channel,
        CreateMessage::new().embed(mod_embeds::message_edited(
            &new.author,
            new.channel_id,
            &link,
            &old.content,
            &new.content,
        )),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BOT: UserId = UserId::new(1);
    const LISTENER: UserId = UserId::new(2);
    const ROOM: ChannelId = ChannelId::new(10);
    const OTHER_ROOM: ChannelId = ChannelId::new(11);

    #[rstest]
    #[case::only_the_bot(vec![(BOT, Some(ROOM))], true)]
    #[case::listener_elsewhere(vec![(BOT, Some(ROOM)), (LISTENER, Some(OTHER_ROOM))], true)]
    #[case::listener_stays(vec![(BOT, Some(ROOM)), (LISTENER, Some(ROOM))], false)]
    #[case::bot_not_there(vec![(BOT, Some(OTHER_ROOM))], false)]
    #[case::listener_left_voice(vec![(BOT, Some(ROOM)), (LISTENER, None)], true)]
    fn detects_an_empty_room(#[case] states: Vec<(UserId, Option<ChannelId>)>, #[case] alone: bool) {
        assert_eq!(left_alone(BOT, ROOM, states), alone);
    }

    fn award(old_xp: u64, new_xp: u64, level_notifs: bool, existed: bool) -> XpAward {
        XpAward {
            old_xp,
            new_xp,
            level_notifs,
            existed,
        }
    }

    #[rstest]
    #[case::crosses_a_level(award(98, 103, true, true), Some(2))]
    #[case::same_level(award(10, 15, true, true), None)]
    #[case::notifications_off(award(98, 103, false, true), None)]
    #[case::first_message(award(0, 5, true, false), None)]
    fn announces_level_ups(#[case] award: XpAward, #[case] expected: Option<u32>) {
        assert_eq!(announced_level(&award), expected);
    }

    #[rstest]
    #[case::typo_fixed("helo", "hello", true)]
    #[case::unchanged("hello", "hello", false)]
    #[case::content_cleared("hello", "", false)]
    #[case::content_added("", "hello", true)]
    fn logs_real_edits(#[case] old: &str, #[case] new: &str, #[case] expected: bool) {
        assert_eq!(edit_worth_logging(old, new), expected);
    }
}
