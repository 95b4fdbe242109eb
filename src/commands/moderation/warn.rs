use poise::serenity_prelude as serenity;

use super::embeds::{ModAction, YELLOW};
use super::{announce, case_field, may_act_on, open_case};
use crate::utils::database::{CaseType, NewCase};
use crate::{CommandResult, Context};

/// Warn a member.
#[poise::command(
    slash_command,
    guild_only,
    category = "Moderation",
    default_member_permissions = "MODERATE_MEMBERS",
    required_permissions = "MODERATE_MEMBERS"
)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "The member to warn"] member: serenity::Member,
    #[description = "Reason for the warning"]
    #[max_length = 512]
    reason: String,
) -> CommandResult {
    ctx.defer().await?;
    if !may_act_on(ctx, &member, "warn").await? {
        return Ok(());
    }

    let case = open_case(
        ctx,
        NewCase {
            case_type: CaseType::Warning,
            user_id: member.user.id,
            moderator_id: ctx.author().id,
            reason: reason.clone(),
            duration: None,
        },
    )?;

    announce(
        ctx,
        &ModAction {
            user: &member.user,
            moderator: ctx.author().id,
            reason: &reason,
            done: "Warned",
            dm_phrase: "warned in",
            fields: vec![case_field(&case)],
            color: YELLOW,
        },
    )
    .await
}
