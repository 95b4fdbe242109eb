use crate::{CommandResult, Context};

/// Turn level-up notifications on or off.
#[poise::command(
    slash_command,
    guild_only,
    category = "Leveling",
    subcommands("on", "off"),
    subcommand_required
)]
pub async fn levelnotifs(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

async fn set(ctx: Context<'_>, enabled: bool) -> CommandResult {
    ctx.data()
        .database
        .set_level_notifs(ctx.author().id, enabled)?;

    let state = if enabled { "enabled" } else { "disabled" };
    ctx.send(
        poise::CreateReply::default()
            .content(format!("Leveling notifications {}.", state))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Get a message when you level up.
#[poise::command(slash_command, guild_only)]
pub async fn on(ctx: Context<'_>) -> CommandResult {
    set(ctx, true).await
}

/// Stop getting level-up messages.
#[poise::command(slash_command, guild_only)]
pub async fn off(ctx: Context<'_>) -> CommandResult {
    set(ctx, false).await
}
