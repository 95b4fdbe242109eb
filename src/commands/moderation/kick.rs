use poise::serenity_prelude as serenity;

use super::embeds::ModAction;
use super::{case_field, may_act_on, notify, open_case, report};
use crate::commands::music::utils::embedded_messages::RED;
use crate::utils::database::{CaseType, NewCase};
use crate::{CommandResult, Context};

/// Kick a member from the server.
#[poise::command(
    slash_command,
    guild_only,
    category = "Moderation",
    default_member_permissions = "KICK_MEMBERS",
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "KICK_MEMBERS"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "The member to kick"] member: serenity::Member,
    #[description = "Reason for the kick"]
    #[max_length = 512]
    reason: String,
) -> CommandResult {
    ctx.defer().await?;
    if !may_act_on(ctx, &member, "kick").await? {
        return Ok(());
    }

    let action = ModAction {
        user: &member.user,
        moderator: ctx.author().id,
        reason: &reason,
        done: "Kicked",
        dm_phrase: "kicked from",
        fields: Vec::new(),
        color: RED,
    };
    // The DM has to go out while they still share a server with the bot.
    notify(ctx, &action).await;
    member
        .guild_id
        .kick_with_reason(ctx, member.user.id, &reason)
        .await?;

    let case = open_case(
        ctx,
        NewCase {
            case_type: CaseType::Kick,
            user_id: member.user.id,
            moderator_id: ctx.author().id,
            reason: reason.clone(),
            duration: None,
        },
    )?;
    report(
        ctx,
        &ModAction {
            fields: vec![case_field(&case)],
            ..action
        },
    )
    .await
}
