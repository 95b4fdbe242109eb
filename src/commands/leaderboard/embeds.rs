use poise::CreateReply;
use serenity::all::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, Timestamp, User, UserId};
use thousands::Separable;

use crate::commands::music::utils::embedded_messages::{BLUE, FUCHSIA, RED};
use crate::utils::xp::LevelInfo;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Everything the stat cards show about one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub rank: u64,
    pub xp: u64,
    pub level: LevelInfo,
}

/// A leaderboard line for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    pub rank: u64,
    pub name: String,
    pub level: u32,
    pub xp: u64,
}

pub fn rank_card(user: &User, standing: &Standing) -> CreateReply {
    let embed = CreateEmbed::new()
        .thumbnail(user.face())
        .description(format!("### 🏆 Leaderboard Stats for <@{}>", user.id))
        .field("Rank", format!("#{}", standing.rank), true)
        .field("Level", standing.level.level.to_string(), true)
        .field(
            "XP",
            format!(
                "{} / {}",
                standing.level.relative_xp.separate_with_commas(),
                standing.level.xp_for_next_level.separate_with_commas()
            ),
            true,
        )
        .field("Total XP", standing.xp.separate_with_commas(), true)
        .field(
            "XP to Next Level",
            standing.level.remaining().separate_with_commas(),
            true,
        )
        .color(BLUE);
    CreateReply::default().embed(embed)
}

pub fn unknown_user() -> CreateReply {
    let embed = CreateEmbed::new()
        .title("❌ Unknown user")
        .description("That user is not on the leaderboard. They must send a message first.")
        .color(RED);
    CreateReply::default().embed(embed).ephemeral(true)
}

/// One line per entry. `top` entries come first; a divider separates a
/// trailing entry for the caller when they aren't in the top list.
pub fn board_lines(top: &[BoardEntry], caller: Option<&BoardEntry>) -> String {
    let line = |entry: &BoardEntry| {
        let medal = entry
            .rank
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| MEDALS.get(i))
            .map(|medal| format!("{} ", medal))
            .unwrap_or_default();
        format!(
            "{}. {}**{}** • Level **{}** • Total XP **{}**",
            entry.rank,
            medal,
            entry.name,
            entry.level,
            entry.xp.separate_with_commas()
        )
    };

    let mut lines: Vec<String> = top.iter().map(line).collect();
    if let Some(caller) = caller {
        lines.push("─────────────".to_string());
        lines.push(line(caller));
    }
    if lines.is_empty() {
        lines.push("Nobody has earned any XP yet.".to_string());
    }
    lines.join("\n")
}

pub fn leaderboard(
    top: &[BoardEntry],
    caller: Option<&BoardEntry>,
    on_board: u64,
    members: Option<u64>,
) -> CreateReply {
    let members = members
        .map(|count| count.separate_with_commas())
        .unwrap_or_else(|| "?".to_string());
    let embed = CreateEmbed::new()
        .author(CreateEmbedAuthor::new("Suroi"))
        .title("🏆 Server Leaderboard")
        .description(board_lines(top, caller))
        .footer(CreateEmbedFooter::new(format!(
            "Members on Leaderboard: {} • Total Members: {}",
            on_board.separate_with_commas(),
            members
        )))
        .color(BLUE);
    CreateReply::default().embed(embed)
}

pub fn level_up(user_id: UserId, standing: &Standing) -> CreateEmbed {
    CreateEmbed::new()
        .title("⏫ Level Up!")
        .description(format!(
            "<@{}> just reached level **{}**!",
            user_id, standing.level.level
        ))
        .field("Rank", format!("#{}", standing.rank), true)
        .field("Total XP", standing.xp.separate_with_commas(), true)
        .field(
            "XP to Next Level",
            standing.level.remaining().separate_with_commas(),
            true,
        )
        .field(
            " ",
            "-# You can disable these notifications using the `/levelnotifs off` command.",
            false,
        )
        .color(FUCHSIA)
        .timestamp(Timestamp::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(rank: u64, name: &str, xp: u64) -> BoardEntry {
        BoardEntry {
            rank,
            name: name.to_string(),
            level: crate::utils::xp::level_for_xp(xp),
            xp,
        }
    }

    #[test]
    fn medals_for_the_podium_only() {
        let top = [
            entry(1, "ada", 3000),
            entry(2, "bob", 1200),
            entry(3, "cy", 300),
            entry(4, "dee", 5),
        ];
        assert_eq!(
            board_lines(&top, None),
            [
                "1. 🥇 **ada** • Level **10** • Total XP **3,000**",
                "2. 🥈 **bob** • Level **6** • Total XP **1,200**",
                "3. 🥉 **cy** • Level **3** • Total XP **300**",
                "4. **dee** • Level **1** • Total XP **5**",
            ]
            .join("\n")
        );
    }

    #[test]
    fn caller_is_appended_after_a_divider() {
        let top = [entry(1, "ada", 3000)];
        let caller = entry(42, "me", 10);
        let lines = board_lines(&top, Some(&caller));

        let last: Vec<&str> = lines.lines().skip(1).collect();
        assert_eq!(
            last,
            vec!["─────────────", "42. **me** • Level **1** • Total XP **10**"]
        );
    }

    #[test]
    fn empty_board_says_so() {
        assert_eq!(board_lines(&[], None), "Nobody has earned any XP yet.");
    }
}
