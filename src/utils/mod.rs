//! Shared plumbing that isn't tied to a single command group.

/// Environment-driven runtime configuration.
pub mod config;
/// SQLite storage for leveling data.
pub mod database;
/// The XP curve and message cooldown.
pub mod xp;
