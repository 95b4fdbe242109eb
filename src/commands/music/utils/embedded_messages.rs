use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter,
    Timestamp,
};
use std::time::Duration;
use thousands::Separable;

use super::{
    format_duration,
    queue_item::QueueItem,
    song_manager::{MusicError, QueueStatus, SessionSnapshot},
};

pub const BLUE: u32 = 0x3498db;
pub const DARK_GREEN: u32 = 0x1f8b4c;
pub const RED: u32 = 0xed4245;
pub const FUCHSIA: u32 = 0xeb459e;

/// Keycap emojis for the search result buttons.
pub const SELECTION_EMOJIS: [&str; 5] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣"];

fn duration_text(duration: Option<Duration>) -> String {
    duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown".to_string())
}

fn link(item: &QueueItem) -> String {
    format!("[**{}**]({})", item.display_title(), item.source_url)
}

/// A title-plus-description embed, the building block for every status reply.
pub fn simple(title: impl Into<String>, description: Option<&str>, color: u32) -> CreateReply {
    let mut embed = CreateEmbed::new().title(title).color(color);
    if let Some(description) = description {
        embed = embed.description(description);
    }
    CreateReply::default().embed(embed)
}

/// The detailed card for one track, used for "now playing", "added" and friends.
pub fn track_embed(item: &QueueItem, heading: &str, color: u32) -> CreateEmbed {
    let mut author = CreateEmbedAuthor::new(item.author.as_deref().unwrap_or("Unknown Channel"));
    if let Some(url) = &item.author_url {
        author = author.url(url);
    }

    let mut embed = CreateEmbed::new()
        .author(author)
        .title(format!("**{}**", item.display_title()))
        .url(&item.source_url)
        .field(" ", heading, false)
        .field("Duration", format!("`{}`", duration_text(item.duration)), true)
        .color(color);

    if let Some(views) = item.view_count {
        embed = embed.field("Views", format!("`{}`", views.separate_with_commas()), true);
    }
    if let Some(uploaded) = &item.uploaded_at {
        embed = embed.field("Uploaded", format!("`{}`", uploaded), true);
    }
    if let Some(thumbnail) = &item.thumbnail_url {
        embed = embed.thumbnail(thumbnail);
    }
    if let Some(requester) = &item.requested_by {
        let mut footer = CreateEmbedFooter::new(format!("Added by {}", requester.name));
        if let Some(avatar) = &requester.avatar_url {
            footer = footer.icon_url(avatar);
        }
        embed = embed.footer(footer);
    }
    if let Some(timestamp) = item
        .requested_at
        .and_then(|at| Timestamp::from_unix_timestamp(at.timestamp()).ok())
    {
        embed = embed.timestamp(timestamp);
    }

    embed
}

pub fn track(item: &QueueItem, heading: &str, color: u32) -> CreateReply {
    CreateReply::default().embed(track_embed(item, heading, color))
}

/// Create an embed for when a song is added to the queue
pub fn added_to_queue(item: &QueueItem, position: usize) -> CreateReply {
    let heading = if position == 1 {
        "Added to Queue".to_string()
    } else {
        format!("Added to Queue at position #{}", position)
    };
    track(item, &heading, DARK_GREEN)
}

/// Create an embed for the music queue
pub fn music_queue(snapshot: &SessionSnapshot) -> CreateReply {
    let status_text = match (snapshot.status, snapshot.paused) {
        (QueueStatus::Downloading, _) => "Downloading...",
        (QueueStatus::Playing, _) => "Now Playing",
        (QueueStatus::Idle, true) => "Paused",
        (QueueStatus::Idle, false) => "Stopped",
    };

    let mut embed = CreateEmbed::new().title("🎶 Queue").color(BLUE);
    if snapshot.queue.is_empty() {
        embed = embed.description("Queue is currently empty.");
    }

    for (index, item) in snapshot.queue.iter().enumerate().take(25) {
        let marker = if index == 0 {
            format!(" ◀️ {}", status_text)
        } else {
            String::new()
        };
        embed = embed.field(
            format!("{}. **{}**", index + 1, item.display_title()),
            format!(
                "{} - `{}`{}",
                item.author.as_deref().unwrap_or("No Channel"),
                duration_text(item.duration),
                marker
            ),
            false,
        );
    }

    let total: Duration = snapshot.queue.iter().filter_map(|item| item.duration).sum();
    if total.as_secs() > 0 {
        embed = embed.footer(CreateEmbedFooter::new(format!(
            "Total duration: {}",
            format_duration(total)
        )));
    }
    if let Some(thumbnail) = snapshot.current().and_then(|item| item.thumbnail_url.as_ref()) {
        embed = embed.thumbnail(thumbnail);
    }

    CreateReply::default().embed(embed)
}

/// Search results with one numbered button per result.
pub fn search_results(
    query: &str,
    items: &[QueueItem],
    id_prefix: &str,
    disabled: bool,
) -> CreateReply {
    let mut embed = CreateEmbed::new()
        .title(format!("🔍 Search Results for **{}**", query))
        .footer(CreateEmbedFooter::new(
            "Click a button below to add a song to the queue.",
        ))
        .color(BLUE);

    for (item, emoji) in items.iter().zip(SELECTION_EMOJIS) {
        embed = embed
            .field(" ", format!("{} {}", emoji, link(item)), false)
            .field(
                " ",
                match (&item.author, &item.author_url) {
                    (Some(author), Some(url)) => format!("[{}]({})", author, url),
                    (Some(author), None) => author.clone(),
                    _ => "No Channel".to_string(),
                },
                false,
            )
            .field("Duration", format!("`{}`", duration_text(item.duration)), true)
            .field(
                "Views",
                format!(
                    "`{}`",
                    item.view_count
                        .map(|views| views.separate_with_commas())
                        .unwrap_or_else(|| "?".to_string())
                ),
                true,
            )
            .field(
                "Uploaded",
                format!("`{}`", item.uploaded_at.as_deref().unwrap_or("?")),
                true,
            );
    }
    if let Some(thumbnail) = items.first().and_then(|item| item.thumbnail_url.as_ref()) {
        embed = embed.thumbnail(thumbnail);
    }

    CreateReply::default()
        .embed(embed)
        .components(selection_buttons(id_prefix, items.len(), disabled))
}

/// Numbered buttons whose custom ids are `<prefix><index>`.
pub fn selection_buttons(id_prefix: &str, count: usize, disabled: bool) -> Vec<CreateActionRow> {
    let buttons = (0..count.min(SELECTION_EMOJIS.len()))
        .map(|i| {
            CreateButton::new(format!("{}{}", id_prefix, i))
                .label((i + 1).to_string())
                .style(ButtonStyle::Primary)
                .disabled(disabled)
        })
        .collect();
    vec![CreateActionRow::Buttons(buttons)]
}

/// Create an embed for when a user is not connected to a voice channel
pub fn cant_use_command() -> CreateReply {
    simple(
        "❌ Can't use command",
        Some("You must be connected to a voice channel to use this command."),
        RED,
    )
    .ephemeral(true)
}

pub fn no_results(query: &str) -> CreateReply {
    simple(format!("❌ No results for **{}**", query), None, RED)
}

pub fn nothing_playing() -> CreateReply {
    simple(
        "Not playing anything",
        Some("Use the /song play command to queue up a song!"),
        BLUE,
    )
}

/// The head is still downloading, so the request was ignored.
pub fn still_downloading() -> CreateReply {
    simple(
        "⏳ Still downloading",
        Some("Wait for the current song to finish downloading and try again."),
        RED,
    )
}

pub fn invalid_queue_position() -> CreateReply {
    simple("❌ That index doesn't exist in the queue", None, RED)
}

pub fn download_failed(item: Option<&QueueItem>, err: &MusicError) -> CreateReply {
    let description = match item {
        Some(item) => format!(
            "Couldn't download {}: {}\nUse `/song retry` to try again or `/song skip` to move on.",
            link(item),
            err
        ),
        None => format!("Couldn't start playback: {}", err),
    };
    simple("❌ Download failed", Some(&description), RED)
}

pub fn music_error(err: &MusicError) -> CreateReply {
    simple("❌ Error", Some(&err.to_string()), RED).ephemeral(true)
}

pub fn so_long() -> CreateReply {
    simple(
        "👋 So long!",
        Some("Cleared queue and left voice channel."),
        DARK_GREEN,
    )
}
