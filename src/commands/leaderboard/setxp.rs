use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{CommandResult, Context};

/// Set a member's total XP.
#[poise::command(
    slash_command,
    guild_only,
    category = "Leveling",
    default_member_permissions = "ADMINISTRATOR",
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setxp(
    ctx: Context<'_>,
    #[description = "Whose XP to set"] user: serenity::User,
    #[description = "The new total XP"]
    #[min = 0]
    #[max = 2147483647]
    xp: u32,
) -> CommandResult {
    ctx.data().database.set_xp(user.id, u64::from(xp))?;
    info!("{} set the XP of {} to {}", ctx.author().name, user.name, xp);

    ctx.say(format!("Set XP of user <@{}> to {}", user.id, xp))
        .await?;
    Ok(())
}
