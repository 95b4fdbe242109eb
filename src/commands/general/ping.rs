use poise::{CreateReply, serenity_prelude as serenity};
use serenity::CreateEmbed;
use std::time::Duration;

use crate::commands::music::utils::embedded_messages::BLUE;
use crate::{CommandResult, Context};

/// Check that the bot is alive and how fast the gateway answers
#[poise::command(slash_command, category = "General")]
pub async fn ping(ctx: Context<'_>) -> CommandResult {
    let latency = match shard_latency(ctx).await {
        Some(latency) => format!("{} ms", latency.as_millis()),
        // Shards report latency only after the first heartbeat ack.
        None => "Measuring...".to_string(),
    };

    let embed = CreateEmbed::new()
        .title("🏓 Pong!")
        .field("Gateway Latency", latency, true)
        .field("Shard", ctx.serenity_context().shard_id.0.to_string(), true)
        .color(BLUE);

    ctx.send(CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

async fn shard_latency(ctx: Context<'_>) -> Option<Duration> {
    let shard_manager = ctx.framework().shard_manager();
    let runners = shard_manager.runners.lock().await;

    runners.get(&ctx.serenity_context().shard_id)?.latency
}
