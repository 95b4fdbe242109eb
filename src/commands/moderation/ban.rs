use poise::serenity_prelude as serenity;
use std::time::Duration;

use super::embeds::{self, ModAction};
use super::{announce, case_field, may_act_on, notify, open_case, report};
use crate::commands::music::utils::embedded_messages::{DARK_GREEN, RED};
use crate::utils::database::{CaseType, NewCase};
use crate::{CommandResult, Context};

/// How much message history to wipe with a ban. Discord counts it in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum DeleteHistory {
    #[name = "Previous day"]
    Day,
    #[name = "Previous 3 days"]
    ThreeDays,
    #[name = "Previous week"]
    Week,
}

impl DeleteHistory {
    pub fn days(self) -> u8 {
        match self {
            DeleteHistory::Day => 1,
            DeleteHistory::ThreeDays => 3,
            DeleteHistory::Week => 7,
        }
    }
}

/// When a banned user may appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum AppealWindow {
    Immediately,
    #[name = "1 month"]
    OneMonth,
    #[name = "2 months"]
    TwoMonths,
    #[name = "3 months"]
    ThreeMonths,
    #[name = "6 months"]
    SixMonths,
    #[name = "1 year"]
    OneYear,
    Never,
}

impl AppealWindow {
    /// `None` means the ban can't be appealed.
    pub fn wait(self) -> Option<Duration> {
        // Average Gregorian month.
        const MONTH: u64 = 2_629_746;
        let secs = match self {
            AppealWindow::Immediately => 0,
            AppealWindow::OneMonth => MONTH,
            AppealWindow::TwoMonths => 2 * MONTH,
            AppealWindow::ThreeMonths => 3 * MONTH,
            AppealWindow::SixMonths => 6 * MONTH,
            AppealWindow::OneYear => 12 * MONTH,
            AppealWindow::Never => return None,
        };
        Some(Duration::from_secs(secs))
    }
}

/// Commands for managing bans.
#[poise::command(
    slash_command,
    guild_only,
    category = "Moderation",
    subcommands("add", "remove"),
    subcommand_required,
    default_member_permissions = "BAN_MEMBERS"
)]
pub async fn ban(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Ban a member.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS"
)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "The member to ban"] member: serenity::Member,
    #[description = "Reason for the ban"]
    #[max_length = 512]
    reason: String,
    #[description = "How much of their message history to delete"]
    delete_messages: Option<DeleteHistory>,
    #[description = "Time after which they may appeal (defaults to Never)"]
    appeal: Option<AppealWindow>,
) -> CommandResult {
    ctx.defer().await?;
    if !may_act_on(ctx, &member, "ban").await? {
        return Ok(());
    }

    let appeal = appeal.unwrap_or(AppealWindow::Never);
    let wait = appeal.wait();
    let mut fields = vec![(
        "Appeal After".to_string(),
        poise::ChoiceParameter::name(&appeal).to_string(),
        true,
    )];

    // The DM has to go out while they still share a server with the bot.
    notify(
        ctx,
        &ModAction {
            user: &member.user,
            moderator: ctx.author().id,
            reason: &reason,
            done: "Banned",
            dm_phrase: "banned from",
            fields: fields.clone(),
            color: RED,
        },
    )
    .await;
    member
        .guild_id
        .ban_with_reason(
            ctx,
            member.user.id,
            delete_messages.map_or(0, DeleteHistory::days),
            &reason,
        )
        .await?;

    let case = open_case(
        ctx,
        NewCase {
            case_type: CaseType::Ban,
            user_id: member.user.id,
            moderator_id: ctx.author().id,
            reason: reason.clone(),
            duration: wait,
        },
    )?;
    fields.push(case_field(&case));
    if let Some(wait) = wait.filter(|wait| !wait.is_zero()) {
        let appeal_at = case.created_at.timestamp() + wait.as_secs() as i64;
        fields.push(("Appeal Date".to_string(), format!("<t:{}:D>", appeal_at), false));
    }

    report(
        ctx,
        &ModAction {
            user: &member.user,
            moderator: ctx.author().id,
            reason: &reason,
            done: "Banned",
            dm_phrase: "banned from",
            fields,
            color: RED,
        },
    )
    .await
}

/// Unban a user.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS"
)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "The user to unban"] user: serenity::User,
    #[description = "Reason for the unban"]
    #[max_length = 512]
    reason: String,
) -> CommandResult {
    ctx.defer().await?;
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    if let Err(e) = guild_id.unban(ctx, user.id).await {
        tracing::debug!("Unban of {} failed: {}", user.name, e);
        ctx.send(embeds::failure(
            "Not banned",
            format!("<@{}> isn't banned here.", user.id),
        ))
        .await?;
        return Ok(());
    }

    announce(
        ctx,
        &ModAction {
            user: &user,
            moderator: ctx.author().id,
            reason: &reason,
            done: "Unbanned",
            dm_phrase: "unbanned from",
            fields: Vec::new(),
            color: DARK_GREEN,
        },
    )
    .await
}
