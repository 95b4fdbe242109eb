pub(crate) mod ban;
pub(crate) mod case;
pub(crate) mod embeds;
pub(crate) mod kick;
pub(crate) mod purge;
pub(crate) mod timeout;
pub(crate) mod warn;

use chrono::Utc;
use poise::serenity_prelude as serenity;
use serenity::{CreateMessage, Guild, Member, RoleId, UserId};
use std::fmt;
use tracing::{debug, info, warn};

use crate::utils::database::{CaseRecord, NewCase};
use crate::{Context, Error};
use embeds::ModAction;

/// Why a moderator can't act on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    Yourself,
    TheBot,
    Owner,
    OutranksModerator,
    OutranksBot,
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Blocker::Yourself => "You can't do that to yourself.",
            Blocker::TheBot => "You can't do that to me.",
            Blocker::Owner => "The server owner is out of reach.",
            Blocker::OutranksModerator => "Their highest role is not below yours.",
            Blocker::OutranksBot => "Their highest role is not below mine.",
        })
    }
}

/// A member's place in the role hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub id: UserId,
    pub top_role: u16,
}

/// Position of the highest of `roles`; members without roles sit at 0.
pub fn top_role_position(guild: &Guild, roles: &[RoleId]) -> u16 {
    roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .map(|role| role.position)
        .max()
        .unwrap_or(0)
}

/// The first rule acting on `target` would break, if any. The owner can act
/// on anyone the bot can reach.
pub fn blocker(
    owner: UserId,
    moderator: Standing,
    target: Standing,
    bot: Standing,
) -> Option<Blocker> {
    if target.id == moderator.id {
        return Some(Blocker::Yourself);
    }
    if target.id == bot.id {
        return Some(Blocker::TheBot);
    }
    if target.id == owner {
        return Some(Blocker::Owner);
    }
    if moderator.id != owner && target.top_role >= moderator.top_role {
        return Some(Blocker::OutranksModerator);
    }
    if target.top_role >= bot.top_role {
        return Some(Blocker::OutranksBot);
    }
    None
}

/// Checks the invoking moderator may act on `target`, replying with the
/// reason when they can't.
async fn may_act_on(ctx: Context<'_>, target: &Member, verb: &str) -> Result<bool, Error> {
    let Some(moderator) = ctx.author_member().await else {
        return Ok(false);
    };
    let bot_id = ctx.cache().current_user().id;

    let blocked = {
        let Some(guild) = ctx.guild() else {
            return Ok(false);
        };
        let bot_roles = guild
            .members
            .get(&bot_id)
            .map(|member| member.roles.clone())
            .unwrap_or_default();
        blocker(
            guild.owner_id,
            Standing {
                id: moderator.user.id,
                top_role: top_role_position(&guild, &moderator.roles),
            },
            Standing {
                id: target.user.id,
                top_role: top_role_position(&guild, &target.roles),
            },
            Standing {
                id: bot_id,
                top_role: top_role_position(&guild, &bot_roles),
            },
        )
    };

    match blocked {
        Some(blocker) => {
            debug!(
                "{} can't {} {}: {:?}",
                ctx.author().name,
                verb,
                target.user.name,
                blocker
            );
            ctx.send(embeds::refused(verb, &target.user, blocker)).await?;
            Ok(false)
        }
        None => Ok(true),
    }
}

fn guild_name(ctx: Context<'_>) -> String {
    ctx.guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "the server".to_string())
}

/// Posts to the moderation log channel when one is configured.
pub(crate) async fn log_to_mod_channel(
    http: impl serenity::CacheHttp,
    channel: Option<serenity::ChannelId>,
    message: CreateMessage,
) {
    let Some(channel) = channel else {
        return;
    };
    if let Err(e) = channel.send_message(http, message).await {
        warn!("Failed to write to the moderation log: {}", e);
    }
}

/// DMs the user about an action against them. Closed DMs aren't an error.
async fn notify(ctx: Context<'_>, action: &ModAction<'_>) {
    let dm = CreateMessage::new().embed(embeds::action_dm(action, &guild_name(ctx)));
    if let Err(e) = action.user.dm(ctx, dm).await {
        debug!("Couldn't DM {}: {}", action.user.name, e);
    }
}

/// Confirms an action to the moderator and writes it to the log.
async fn report(ctx: Context<'_>, action: &ModAction<'_>) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(embeds::action_reply(action)))
        .await?;

    log_to_mod_channel(
        ctx,
        ctx.data().config.moderation_log_channel_id,
        CreateMessage::new().embed(embeds::action_log(action)),
    )
    .await;
    Ok(())
}

/// Notifies and reports, for actions that leave the user in the server.
async fn announce(ctx: Context<'_>, action: &ModAction<'_>) -> Result<(), Error> {
    notify(ctx, action).await;
    report(ctx, action).await
}

fn open_case(ctx: Context<'_>, case: NewCase) -> Result<CaseRecord, Error> {
    let record = ctx.data().database.create_case(&case, Utc::now())?;
    info!(
        "{} opened case #{} ({}) against {}",
        ctx.author().name,
        record.id,
        record.case_type.as_str(),
        record.user_id
    );
    Ok(record)
}

/// Embed fields every case-backed action reply shares.
fn case_field(record: &CaseRecord) -> (String, String, bool) {
    ("Case ID".to_string(), format!("`{}`", record.id), true)
}
