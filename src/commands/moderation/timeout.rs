use chrono::Utc;
use poise::serenity_prelude as serenity;
use serenity::{EditMember, Timestamp};
use std::time::Duration;

use super::embeds::{self, ModAction};
use super::{announce, case_field, may_act_on, open_case};
use crate::commands::music::utils::embedded_messages::{DARK_GREEN, RED};
use crate::utils::database::{CaseType, NewCase};
use crate::{CommandResult, Context};

/// Timeout lengths offered to moderators. Discord caps timeouts at 28 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum TimeoutLength {
    #[name = "1 minute"]
    OneMinute,
    #[name = "5 minutes"]
    FiveMinutes,
    #[name = "10 minutes"]
    TenMinutes,
    #[name = "30 minutes"]
    HalfHour,
    #[name = "1 hour"]
    OneHour,
    #[name = "2 hours"]
    TwoHours,
    #[name = "6 hours"]
    SixHours,
    #[name = "12 hours"]
    TwelveHours,
    #[name = "1 day"]
    OneDay,
    #[name = "2 days"]
    TwoDays,
    #[name = "1 week"]
    OneWeek,
    #[name = "2 weeks"]
    TwoWeeks,
    #[name = "1 month"]
    OneMonth,
}

impl TimeoutLength {
    pub fn duration(self) -> Duration {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;
        const DAY: u64 = 24 * HOUR;
        Duration::from_secs(match self {
            TimeoutLength::OneMinute => MINUTE,
            TimeoutLength::FiveMinutes => 5 * MINUTE,
            TimeoutLength::TenMinutes => 10 * MINUTE,
            TimeoutLength::HalfHour => 30 * MINUTE,
            TimeoutLength::OneHour => HOUR,
            TimeoutLength::TwoHours => 2 * HOUR,
            TimeoutLength::SixHours => 6 * HOUR,
            TimeoutLength::TwelveHours => 12 * HOUR,
            TimeoutLength::OneDay => DAY,
            TimeoutLength::TwoDays => 2 * DAY,
            TimeoutLength::OneWeek => 7 * DAY,
            TimeoutLength::TwoWeeks => 14 * DAY,
            TimeoutLength::OneMonth => 28 * DAY,
        })
    }
}

/// Commands for managing timeouts.
#[poise::command(
    slash_command,
    guild_only,
    category = "Moderation",
    subcommands("add", "remove"),
    subcommand_required,
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn timeout(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Timeout a member.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS"
)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "The member to timeout"] member: serenity::Member,
    #[description = "Reason for the timeout"]
    #[max_length = 512]
    reason: String,
    #[description = "Duration of the timeout"] duration: TimeoutLength,
) -> CommandResult {
    ctx.defer().await?;
    if !may_act_on(ctx, &member, "timeout").await? {
        return Ok(());
    }

    let length = duration.duration();
    let expires = Utc::now().timestamp() + length.as_secs() as i64;
    member
        .guild_id
        .edit_member(
            ctx,
            member.user.id,
            EditMember::new()
                .disable_communication_until_datetime(Timestamp::from_unix_timestamp(expires)?)
                .audit_log_reason(&reason),
        )
        .await?;

    let case = open_case(
        ctx,
        NewCase {
            case_type: CaseType::Timeout,
            user_id: member.user.id,
            moderator_id: ctx.author().id,
            reason: reason.clone(),
            duration: Some(length),
        },
    )?;

    announce(
        ctx,
        &ModAction {
            user: &member.user,
            moderator: ctx.author().id,
            reason: &reason,
            done: "Timed out",
            dm_phrase: "timed out in",
            fields: vec![
                (
                    "Duration".to_string(),
                    poise::ChoiceParameter::name(&duration).to_string(),
                    true,
                ),
                case_field(&case),
                ("Expires".to_string(), format!("<t:{}:F>", expires), false),
            ],
            color: RED,
        },
    )
    .await
}

/// Remove a member's timeout.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS"
)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "The member to remove the timeout from"] member: serenity::Member,
    #[description = "Reason for the timeout removal"]
    #[max_length = 512]
    reason: String,
) -> CommandResult {
    ctx.defer().await?;
    if member
        .communication_disabled_until
        .is_none_or(|until| until <= Timestamp::now())
    {
        ctx.send(embeds::failure(
            "Not timed out",
            format!("<@{}> isn't timed out.", member.user.id),
        ))
        .await?;
        return Ok(());
    }
    if !may_act_on(ctx, &member, "remove the timeout of").await? {
        return Ok(());
    }

    member
        .guild_id
        .edit_member(
            ctx,
            member.user.id,
            EditMember::new()
                .enable_communication()
                .audit_log_reason(&reason),
        )
        .await?;

    announce(
        ctx,
        &ModAction {
            user: &member.user,
            moderator: ctx.author().id,
            reason: &reason,
            done: "Removed timeout from",
            dm_phrase: "removed from timeout in",
            fields: Vec::new(),
            color: DARK_GREEN,
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise::ChoiceParameter;
    use test_case::test_case;

    #[test_case(TimeoutLength::OneMinute, 60 ; "one minute")]
    #[test_case(TimeoutLength::HalfHour, 1800 ; "half an hour")]
    #[test_case(TimeoutLength::OneWeek, 604_800 ; "one week")]
    #[test_case(TimeoutLength::OneMonth, 2_419_200 ; "a month is 28 days")]
    fn lengths(length: TimeoutLength, secs: u64) {
        assert_eq!(length.duration(), Duration::from_secs(secs));
    }

    #[test]
    fn every_choice_fits_discords_limit() {
        let limit = Duration::from_secs(28 * 24 * 60 * 60);
        for choice in TimeoutLength::list() {
            let length = TimeoutLength::from_name(&choice.name).unwrap();
            assert!(length.duration() <= limit, "{} is too long", choice.name);
        }
    }
}
