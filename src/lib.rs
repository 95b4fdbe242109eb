//! Suroi community Discord bot: leveling, moderation cases and a per-guild
//! music queue.

pub mod commands;
pub mod events;
pub mod utils;

use std::sync::Arc;

use commands::music::utils::{backends::SearchProvider, song_manager::SongManager};
use utils::{config::Config, database::Database, xp::XpCooldown};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// State shared by every command and event handler.
pub struct Data {
    pub config: Config,
    pub database: Database,
    pub songs: SongManager,
    pub search: Arc<dyn SearchProvider>,
    pub xp_cooldown: XpCooldown,
}

/// Show help for all commands, or just one.
#[poise::command(slash_command, category = "General")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
pub async fn register(ctx: Context<'_>) -> CommandResult {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

/// Every command the bot registers.
pub fn commands() -> Vec<poise::Command<Data, Error>> {
    use commands::{
        general::ping::ping,
        leaderboard::{
            leaderboard::leaderboard, levelnotifs::levelnotifs, rank::rank, setxp::setxp,
        },
        moderation::{
            ban::ban, case::case, kick::kick, purge::purge, timeout::timeout, warn::warn,
        },
        music::song,
    };

    vec![
        register(),
        help(),
        ping(),
        song(),
        rank(),
        leaderboard(),
        levelnotifs(),
        setxp(),
        warn(),
        kick(),
        ban(),
        timeout(),
        case(),
        purge(),
    ]
}
