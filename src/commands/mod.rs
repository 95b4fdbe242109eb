//! This module aggregates all the command modules for the bot.

/// General purpose commands (e.g., ping).
pub(crate) mod general;
/// XP, ranks and the server leaderboard.
pub(crate) mod leaderboard;
/// Warnings, kicks, bans and timeouts, each recorded as a case.
pub(crate) mod moderation;
/// Queue-based music playback, backed by the song manager.
pub mod music;
