use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use suroibot::commands::music::utils::{
    discord_backend::{DiscordNotifier, SongbirdTransport},
    downloader::YtDlpDownloader,
    song_cache::FsCacheStore,
    song_manager::{Backends, SongManager},
    youtube::YtDlpSearch,
};
use suroibot::utils::{
    config::Config,
    database::Database,
    xp::{MESSAGE_COOLDOWN, XpCooldown},
};
use suroibot::{Data, Error, events};

/// Messages kept per channel.
const MESSAGE_CACHE_SIZE: usize = 200;

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            let reply = poise::CreateReply::default()
                .content(format!(
                    "Please wait {} seconds before using this command again.",
                    remaining_cooldown.as_secs().max(1)
                ))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                warn!("Failed to report cooldown: {}", e);
            }
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Command /{} failed: {}", ctx.command().qualified_name, error);
            let reply = poise::CreateReply::default()
                .content("Something went wrong while running that command.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                warn!("Failed to report command error: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("suroibot=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let database = Database::open(&config.database_path)?;

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let token = config.discord_token.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: suroibot::commands(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                match config.main_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            guild_id,
                        )
                        .await?;
                        info!("Registered commands in guild {}", guild_id);
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        info!("Registered commands globally");
                    }
                }

                let songbird = songbird::get(ctx)
                    .await
                    .ok_or("Songbird was not registered on the client")?;

                let cache = FsCacheStore::new(&config.song_cache_dir);
                cache.ensure_dir().await?;
                info!("Caching songs in {}", cache.dir().display());

                let cookies = config.cookies_path.clone();
                let songs = SongManager::spawn(
                    Backends {
                        transport: Arc::new(SongbirdTransport::new(songbird)),
                        downloader: Arc::new(YtDlpDownloader::new(
                            &config.downloader_path,
                            Some(cookies),
                        )),
                        cache: Arc::new(cache),
                        notifier: Arc::new(DiscordNotifier::new(ctx.http.clone())),
                    },
                    Some(config.download_timeout),
                );

                Ok(Data {
                    search: Arc::new(YtDlpSearch::new(&config.downloader_path)),
                    config,
                    database,
                    songs,
                    xp_cooldown: XpCooldown::new(MESSAGE_COOLDOWN),
                })
            })
        })
        .build();

    // Deleted and edited messages can only be logged while they're cached.
    let mut cache_settings = ::serenity::cache::Settings::default();
    cache_settings.max_messages = MESSAGE_CACHE_SIZE;

    let mut client = ClientBuilder::new(token, intents)
        .cache_settings(cache_settings)
        .framework(framework)
        .register_songbird()
        .await?;

    client.start().await.map_err(Into::into)
}
