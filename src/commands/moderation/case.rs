use poise::serenity_prelude as serenity;
use serenity::{ComponentInteractionCollector, CreateInteractionResponse, CreateMessage};
use std::time::Duration;
use tracing::{debug, info};

use super::embeds;
use super::log_to_mod_channel;
use crate::{CommandResult, Context};

pub const CASES_PER_PAGE: u64 = 5;
const CONFIRM_WINDOW: Duration = Duration::from_secs(20);

pub fn page_count(total: u64) -> u32 {
    u32::try_from(total.div_ceil(CASES_PER_PAGE)).unwrap_or(u32::MAX)
}

/// Row offset of a 1-based page. A user without cases still has page 1.
pub fn page_offset(page: u32, total: u64) -> Option<usize> {
    if page == 0 || page > page_count(total).max(1) {
        return None;
    }
    usize::try_from(u64::from(page - 1) * CASES_PER_PAGE).ok()
}

/// Commands for managing moderation cases.
#[poise::command(
    slash_command,
    guild_only,
    category = "Moderation",
    subcommands("list", "info", "delete"),
    subcommand_required,
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn case(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// List a user's cases.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    user_cooldown = 5
)]
pub async fn list(
    ctx: Context<'_>,
    #[description = "The user to list cases for"] user: serenity::User,
    #[description = "The page of cases to view"]
    #[min = 1]
    page: Option<u32>,
) -> CommandResult {
    let database = &ctx.data().database;
    let total = database.case_count_for_user(user.id)?;
    let pages = page_count(total);
    let page = page.unwrap_or(1);

    let Some(offset) = page_offset(page, total) else {
        ctx.send(embeds::failure(
            "Invalid page",
            format!("Please enter a page number between 1 and {}.", pages.max(1)),
        ))
        .await?;
        return Ok(());
    };

    let cases = database.cases_for_user(user.id, CASES_PER_PAGE as usize, offset)?;
    ctx.send(
        poise::CreateReply::default().embed(embeds::case_list(&user, &cases, page, pages, total)),
    )
    .await?;
    Ok(())
}

/// Get information about a specific case.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    user_cooldown = 5
)]
pub async fn info(
    ctx: Context<'_>,
    #[description = "The case number"]
    #[min = 1]
    number: u64,
) -> CommandResult {
    let Some(case) = ctx.data().database.get_case(number)? else {
        ctx.send(embeds::failure(
            "Unknown case",
            format!("Could not find case **#{}**.", number),
        ))
        .await?;
        return Ok(());
    };

    let user = case.user_id.to_user(ctx).await?;
    ctx.send(poise::CreateReply::default().embed(embeds::case_info(&case, &user, false)))
        .await?;
    Ok(())
}

/// Delete a case.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    user_cooldown = 5
)]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "The case number"]
    #[min = 1]
    number: u64,
) -> CommandResult {
    let database = &ctx.data().database;
    let Some(case) = database.get_case(number)? else {
        ctx.send(embeds::failure(
            "Unknown case",
            format!("Could not find case **#{}**.", number),
        ))
        .await?;
        return Ok(());
    };
    let user = case.user_id.to_user(ctx).await?;

    let prefix = format!("{}_", ctx.id());
    let pending = embeds::case_info(&case, &user, true).timestamp(serenity::Timestamp::now());
    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(pending.clone())
                .components(embeds::confirm_buttons(
                    &prefix,
                    "🗑️ Delete Case (CANNOT UNDO!)",
                    false,
                )),
        )
        .await?;

    let filter_prefix = prefix.clone();
    let press = ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(CONFIRM_WINDOW)
        .filter(move |press| press.data.custom_id.starts_with(&filter_prefix))
        .await;

    reply
        .edit(
            ctx,
            poise::CreateReply::default()
                .embed(pending.clone())
                .components(embeds::confirm_buttons(
                    &prefix,
                    "🗑️ Delete Case (CANNOT UNDO!)",
                    true,
                )),
        )
        .await?;

    let Some(press) = press else {
        debug!("Deletion of case #{} timed out", number);
        return Ok(());
    };
    press
        .create_response(ctx, CreateInteractionResponse::Acknowledge)
        .await?;

    if press.data.custom_id != format!("{}confirm", prefix) {
        ctx.send(embeds::failure("Deletion canceled", "The case was kept."))
            .await?;
        return Ok(());
    }

    if !database.delete_case(number)? {
        ctx.send(embeds::failure(
            "Unknown case",
            format!("Case **#{}** was already deleted.", number),
        ))
        .await?;
        return Ok(());
    }
    info!("{} deleted case #{}", ctx.author().name, number);

    let deleted = embeds::case_info(&case, &user, true)
        .title(format!(
            "{} Case #**{}** Deleted",
            embeds::case_emoji(case.case_type),
            number
        ))
        .field("Case Deleted By", format!("<@{}>", ctx.author().id), false)
        .timestamp(serenity::Timestamp::now());
    log_to_mod_channel(
        ctx,
        ctx.data().config.moderation_log_channel_id,
        CreateMessage::new().embed(deleted),
    )
    .await;

    ctx.send(poise::CreateReply::default().embed(embeds::success(
        "Case deleted",
        format!("Case **#{}** deleted successfully.", number),
    )))
    .await?;
    Ok(())
}
