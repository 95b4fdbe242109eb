use futures::future::join_all;
use poise::serenity_prelude as serenity;
use serenity::UserId;

use super::embeds::{self, BoardEntry};
use crate::utils::{database::UserRecord, xp};
use crate::{CommandResult, Context};

const BOARD_SIZE: usize = 10;

async fn display_name(ctx: Context<'_>, user_id: UserId) -> String {
    match user_id.to_user(ctx).await {
        Ok(user) => user.display_name().to_string(),
        Err(_) => format!("<@{}>", user_id),
    }
}

async fn entry(ctx: Context<'_>, rank: u64, record: &UserRecord) -> BoardEntry {
    BoardEntry {
        rank,
        name: display_name(ctx, record.user_id).await,
        level: xp::level_for_xp(record.xp),
        xp: record.xp,
    }
}

/// Show the server's top members by XP.
#[poise::command(slash_command, guild_only, category = "Leveling")]
pub async fn leaderboard(ctx: Context<'_>) -> CommandResult {
    ctx.defer().await?;
    let database = &ctx.data().database;

    let top = database.top_users(BOARD_SIZE)?;
    let on_board = database.user_count()?;

    let author = ctx.author().id;
    let caller = match top.iter().any(|row| row.user.user_id == author) {
        true => None,
        false => database.get_user(author)?,
    };
    let caller = match caller {
        Some(record) => {
            let rank = database.rank_for_xp(record.xp)?;
            Some(entry(ctx, rank, &record).await)
        }
        None => None,
    };

    let top = join_all(top.iter().map(|row| entry(ctx, row.rank, &row.user))).await;
    let members = ctx.guild().map(|guild| guild.member_count);

    ctx.send(embeds::leaderboard(&top, caller.as_ref(), on_board, members))
        .await?;
    Ok(())
}
