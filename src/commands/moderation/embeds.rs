use humantime_serde::re::humantime;
use poise::CreateReply;
use regex::Regex;
use serenity::all::{
    ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedAuthor,
    CreateEmbedFooter, GuildId, MessageId, Timestamp, User, UserId,
};
use std::sync::LazyLock;
use std::time::Duration;

use super::Blocker;
use crate::commands::music::utils::embedded_messages::{BLUE, DARK_GREEN, RED};
use crate::utils::database::{CaseRecord, CaseType};

pub const YELLOW: u32 = 0xffc107;
pub const BLURPLE: u32 = 0x5865f2;

/// Embed descriptions cap at 4096 characters; this leaves room for the heading.
const LOGGED_CONTENT_LIMIT: usize = 3896;
const FIELD_LIMIT: usize = 1024;

static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

/// A moderation action that went through, ready to be reported.
pub struct ModAction<'a> {
    pub user: &'a User,
    pub moderator: UserId,
    pub reason: &'a str,
    /// "Warned", "Banned", ...
    pub done: &'static str,
    /// Finishes "You have been ..." in the DM, e.g. "kicked from".
    pub dm_phrase: &'static str,
    pub fields: Vec<(String, String, bool)>,
    pub color: u32,
}

pub fn action_reply(action: &ModAction<'_>) -> CreateEmbed {
    CreateEmbed::new()
        .description(format!("### ✅ {} <@{}>", action.done, action.user.id))
        .field("Reason", action.reason, false)
        .fields(action.fields.clone())
        .color(action.color)
}

pub fn action_dm(action: &ModAction<'_>, guild_name: &str) -> CreateEmbed {
    CreateEmbed::new()
        .description(format!(
            "### You have been {} **{}**",
            action.dm_phrase, guild_name
        ))
        .field("Reason", action.reason, false)
        .fields(action.fields.clone())
        .color(action.color)
        .timestamp(Timestamp::now())
}

pub fn action_log(action: &ModAction<'_>) -> CreateEmbed {
    CreateEmbed::new()
        .author(CreateEmbedAuthor::new(&action.user.name).icon_url(action.user.face()))
        .description(format!("### {} <@{}>", action.done, action.user.id))
        .field("Reason", action.reason, false)
        .fields(action.fields.clone())
        .field("Responsible Moderator", format!("<@{}>", action.moderator), false)
        .footer(CreateEmbedFooter::new(format!("User ID: {}", action.user.id)))
        .color(action.color)
        .timestamp(Timestamp::now())
}

pub fn refused(verb: &str, user: &User, blocker: Blocker) -> CreateReply {
    let embed = CreateEmbed::new()
        .title(format!("❌ Can't {} {}", verb, user.name))
        .description(blocker.to_string())
        .color(RED);
    CreateReply::default().embed(embed).ephemeral(true)
}

pub fn failure(title: &str, description: impl Into<String>) -> CreateReply {
    let embed = CreateEmbed::new()
        .title(format!("❌ {}", title))
        .description(description)
        .color(RED);
    CreateReply::default().embed(embed)
}

pub fn success(title: &str, description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("✅ {}", title))
        .description(description)
        .color(DARK_GREEN)
}

pub fn case_emoji(case_type: CaseType) -> &'static str {
    match case_type {
        CaseType::Warning => "⚠️",
        CaseType::Timeout => "⏳",
        CaseType::Kick => "👢",
        CaseType::Ban => "🔨",
    }
}

pub fn case_name(case_type: CaseType) -> &'static str {
    match case_type {
        CaseType::Warning => "Warning",
        CaseType::Timeout => "Timeout",
        CaseType::Kick => "Kick",
        CaseType::Ban => "Ban",
    }
}

pub fn duration_label(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// `None` is a ban nobody may appeal.
pub fn appeal_label(appeal: Option<Duration>) -> String {
    match appeal {
        None => "Never".to_string(),
        Some(wait) if wait.is_zero() => "Immediately".to_string(),
        Some(wait) => duration_label(wait),
    }
}

fn discord_time(timestamp: i64, style: char) -> String {
    format!("<t:{}:{}>", timestamp, style)
}

/// Everything known about a case, in display order.
pub fn case_fields(case: &CaseRecord) -> Vec<(String, String, bool)> {
    let created = case.created_at.timestamp();
    let timed = |secs: Duration| created.saturating_add(secs.as_secs() as i64);

    let (duration_field, expiry_field) = match case.case_type {
        CaseType::Timeout => match case.duration {
            Some(length) => (
                Some(("Duration", duration_label(length))),
                Some(("Expires", discord_time(timed(length), 'F'))),
            ),
            None => (None, None),
        },
        CaseType::Ban => (
            Some(("Appeal After", appeal_label(case.duration))),
            case.duration
                .filter(|wait| !wait.is_zero())
                .map(|wait| ("Appeal Date", discord_time(timed(wait), 'D'))),
        ),
        CaseType::Warning | CaseType::Kick => (None, None),
    };

    let mut fields = vec![
        ("User".to_string(), format!("<@{}>", case.user_id), false),
        (
            "Type".to_string(),
            case_name(case.case_type).to_string(),
            duration_field.is_some(),
        ),
    ];
    if let Some((name, value)) = duration_field {
        fields.push((name.to_string(), value, true));
    }
    fields.push(("Reason".to_string(), case.reason.clone(), false));
    fields.push(("Date".to_string(), discord_time(created, 'F'), false));
    if let Some((name, value)) = expiry_field {
        fields.push((name.to_string(), value, true));
    }
    fields.push((
        "Responsible Moderator".to_string(),
        format!("<@{}>", case.moderator_id),
        false,
    ));
    fields
}

pub fn case_info(case: &CaseRecord, user: &User, deleting: bool) -> CreateEmbed {
    let heading = if deleting { "Deleting Case" } else { "Case" };
    CreateEmbed::new()
        .author(CreateEmbedAuthor::new(&user.name).icon_url(user.face()))
        .title(format!(
            "{} {} #**{}**",
            case_emoji(case.case_type),
            heading,
            case.id
        ))
        .fields(case_fields(case))
        .footer(CreateEmbedFooter::new(format!("User ID: {}", user.id)))
        .color(if deleting { RED } else { BLUE })
}

pub fn case_list(user: &User, cases: &[CaseRecord], page: u32, pages: u32, total: u64) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .author(CreateEmbedAuthor::new(&user.name).icon_url(user.face()))
        .title(format!("Cases for {}", user.name))
        .footer(CreateEmbedFooter::new(format!(
            "Page {} of {} • {} total",
            page,
            pages.max(1),
            total
        )))
        .color(BLUE);
    if cases.is_empty() {
        return embed.description("No cases on record.");
    }
    embed.fields(cases.iter().map(|case| {
        (
            format!(
                "{} Case #{} • {}",
                case_emoji(case.case_type),
                case.id,
                case_name(case.case_type)
            ),
            format!(
                "{}\n{} by <@{}>",
                truncate(&case.reason, 900),
                discord_time(case.created_at.timestamp(), 'R'),
                case.moderator_id
            ),
            false,
        )
    }))
}

/// Cancel and confirm buttons sharing `id_prefix`.
pub fn confirm_buttons(id_prefix: &str, confirm_label: &str, disabled: bool) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(format!("{}cancel", id_prefix))
            .label("Cancel")
            .style(ButtonStyle::Secondary)
            .disabled(disabled),
        CreateButton::new(format!("{}confirm", id_prefix))
            .label(confirm_label)
            .style(ButtonStyle::Danger)
            .disabled(disabled),
    ])]
}

pub fn message_count(count: usize) -> String {
    match count {
        1 => "**1** message".to_string(),
        n => format!("**{}** messages", n),
    }
}

pub fn confirm_purge(count: usize, channel: ChannelId) -> CreateEmbed {
    let messages = message_count(count);
    CreateEmbed::new()
        .description(format!(
            "### 🗑️ Confirm purge of {} from <#{}>\n\
             Are you sure you want to **permanently delete** the last {} from this channel?\n\
             **WARNING: THIS ACTION CANNOT BE UNDONE!**",
            messages, channel, messages
        ))
        .color(RED)
        .timestamp(Timestamp::now())
}

pub fn purge_log(count: usize, channel: ChannelId, moderator: UserId) -> CreateEmbed {
    CreateEmbed::new()
        .description(format!(
            "### 🗑️ {} purged from <#{}> by <@{}>",
            message_count(count),
            channel,
            moderator
        ))
        .color(RED)
        .timestamp(Timestamp::now())
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn has_link(text: &str) -> bool {
    LINK.is_match(text)
}

fn prefix_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Deleted content as a red diff block. Links skip the code block so they
/// still resolve.
pub fn removed_content(content: &str) -> String {
    if has_link(content) {
        truncate(&prefix_lines(content, "\\- "), LOGGED_CONTENT_LIMIT)
    } else {
        format!(
            "```diff\n{}\n```",
            truncate(&prefix_lines(content, "- "), LOGGED_CONTENT_LIMIT)
        )
    }
}

/// How an edit is shown: inline as a diff block, or as old/new fields when
/// links would be swallowed by the code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditView {
    Diff(String),
    Fields(Vec<(String, String, bool)>),
}

pub fn edit_view(old: &str, new: &str) -> EditView {
    let old_field = prefix_lines(old, "\\- ");
    let new_field = prefix_lines(new, "+ ");
    let use_diff = (!has_link(old) && !has_link(new))
        || old_field.chars().count() > FIELD_LIMIT
        || new_field.chars().count() > FIELD_LIMIT;

    if use_diff {
        let mut diff = String::new();
        if !old.is_empty() {
            diff.push_str(&prefix_lines(old, "- "));
            diff.push('\n');
        }
        diff.push_str(&prefix_lines(new, "+ "));
        return EditView::Diff(format!(
            "```diff\n{}\n```",
            truncate(&diff, LOGGED_CONTENT_LIMIT)
        ));
    }

    let mut fields = Vec::new();
    if !old.is_empty() {
        fields.push(("Old Message".to_string(), old_field, false));
    }
    fields.push(("New Message".to_string(), new_field, false));
    EditView::Fields(fields)
}

pub fn message_link(guild: GuildId, channel: ChannelId, message: MessageId) -> String {
    format!(
        "https://discord.com/channels/{}/{}/{}",
        guild, channel, message
    )
}

pub fn message_deleted(
    author: &User,
    channel: ChannelId,
    content: &str,
    attachments: &[String],
) -> CreateEmbed {
    let mut description = format!(
        "### 🗑️ Message by <@{}> deleted in <#{}>\n",
        author.id, channel
    );
    if !content.is_empty() {
        description.push_str(&removed_content(content));
    }
    let mut embed = CreateEmbed::new()
        .author(CreateEmbedAuthor::new(&author.name).icon_url(author.face()))
        .description(description)
        .footer(CreateEmbedFooter::new(format!("User ID: {}", author.id)))
        .color(RED)
        .timestamp(Timestamp::now());
    if !attachments.is_empty() {
        embed = embed.field(
            "Attachments",
            truncate(&attachments.join("\n"), FIELD_LIMIT),
            false,
        );
    }
    embed
}

pub fn message_edited(author: &User, channel: ChannelId, link: &str, old: &str, new: &str) -> CreateEmbed {
    let heading = format!(
        "### ✏️ Message by <@{}> edited in <#{}>\n[Jump to message]({})\n",
        author.id, channel, link
    );
    let embed = CreateEmbed::new()
        .author(CreateEmbedAuthor::new(&author.name).icon_url(author.face()))
        .footer(CreateEmbedFooter::new(format!("User ID: {}", author.id)))
        .color(BLURPLE)
        .timestamp(Timestamp::now());
    match edit_view(old, new) {
        EditView::Diff(diff) => embed.description(heading + &diff),
        EditView::Fields(fields) => embed.description(heading).fields(fields),
    }
}
