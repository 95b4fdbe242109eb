use poise::serenity_prelude as serenity;

use super::{embeds, standing};
use crate::{CommandResult, Context};

/// Show your rank, level and XP, or someone else's.
#[poise::command(slash_command, guild_only, category = "Leveling")]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "Whose stats to show (defaults to you)"] user: Option<serenity::User>,
) -> CommandResult {
    let user = user.as_ref().unwrap_or_else(|| ctx.author());
    let database = &ctx.data().database;

    let reply = match database.get_user(user.id)? {
        Some(record) => embeds::rank_card(user, &standing(database, record.xp)?),
        None => embeds::unknown_user(),
    };
    ctx.send(reply).await?;
    Ok(())
}
