//! Runtime configuration, read from the process environment (and `.env`).

use humantime_serde::re::humantime;
use serenity::all::{ChannelId, GuildId};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub discord_token: String,
    /// Register commands in this guild only; otherwise globally.
    /// Leveling only counts messages from this guild when set.
    pub main_guild_id: Option<GuildId>,
    /// Where level-up notifications go; otherwise the message's channel.
    pub leveling_channel_id: Option<ChannelId>,
    /// Moderation actions and message edit/delete logs go here. Nothing is
    /// logged when unset.
    pub moderation_log_channel_id: Option<ChannelId>,
    pub downloader_path: PathBuf,
    /// Passed to the downloader only when the file exists.
    pub cookies_path: PathBuf,
    pub song_cache_dir: PathBuf,
    pub download_timeout: Duration,
    pub database_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let path_or =
            |key: &str, default: &str| PathBuf::from(get(key).unwrap_or_else(|| default.to_string()));

        let download_timeout = match get("SONG_DOWNLOAD_TIMEOUT") {
            Some(raw) => parse_timeout("SONG_DOWNLOAD_TIMEOUT", &raw)?,
            None => Duration::from_secs(5 * 60),
        };

        Ok(Self {
            discord_token: get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?,
            main_guild_id: parse_id("MAIN_GUILD_ID", get("MAIN_GUILD_ID"))?.map(GuildId::new),
            leveling_channel_id: parse_id("LEVELING_CHANNEL_ID", get("LEVELING_CHANNEL_ID"))?
                .map(ChannelId::new),
            moderation_log_channel_id: parse_id(
                "MODERATION_LOG_CHANNEL_ID",
                get("MODERATION_LOG_CHANNEL_ID"),
            )?
            .map(ChannelId::new),
            downloader_path: path_or("YOUTUBE_DOWNLOADER_PATH", "yt-dlp"),
            cookies_path: path_or("YOUTUBE_COOKIES_PATH", "data/cookies.txt"),
            song_cache_dir: path_or("SONG_CACHE_DIR", "data/songs"),
            download_timeout,
            database_path: path_or("DATABASE_PATH", "data/suroibot.db"),
        })
    }
}

/// A zero timeout would fail every download before it starts.
fn parse_timeout(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match humantime::parse_duration(raw) {
        Ok(timeout) if timeout.is_zero() => Err(ConfigError::Invalid {
            name,
            reason: "timeouts must be longer than zero".to_string(),
        }),
        Ok(timeout) => Ok(timeout),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

/// Discord snowflakes are non-zero `u64`s.
fn parse_id(name: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "ids can't be zero".to_string(),
        }),
        Ok(id) => Ok(Some(id)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let config = config(&[("DISCORD_TOKEN", "token")]).unwrap();

        assert_eq!(
            config,
            Config {
                discord_token: "token".to_string(),
                main_guild_id: None,
                leveling_channel_id: None,
                moderation_log_channel_id: None,
                downloader_path: PathBuf::from("yt-dlp"),
                cookies_path: PathBuf::from("data/cookies.txt"),
                song_cache_dir: PathBuf::from("data/songs"),
                download_timeout: Duration::from_secs(300),
                database_path: PathBuf::from("data/suroibot.db"),
            }
        );
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("DISCORD_TOKEN", "token"),
            ("MAIN_GUILD_ID", "123"),
            ("LEVELING_CHANNEL_ID", " 456 "),
            ("MODERATION_LOG_CHANNEL_ID", "789"),
            ("SONG_DOWNLOAD_TIMEOUT", "90s"),
            ("SONG_CACHE_DIR", "/var/cache/songs"),
        ])
        .unwrap();

        assert_eq!(config.main_guild_id, Some(GuildId::new(123)));
        assert_eq!(config.leveling_channel_id, Some(ChannelId::new(456)));
        assert_eq!(config.moderation_log_channel_id, Some(ChannelId::new(789)));
        assert_eq!(config.download_timeout, Duration::from_secs(90));
        assert_eq!(config.song_cache_dir, PathBuf::from("/var/cache/songs"));
    }

    #[test]
    fn token_is_required() {
        assert_eq!(config(&[]), Err(ConfigError::Missing("DISCORD_TOKEN")));
        assert_eq!(
            config(&[("DISCORD_TOKEN", "   ")]),
            Err(ConfigError::Missing("DISCORD_TOKEN"))
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert_matches!(
            config(&[("DISCORD_TOKEN", "t"), ("MAIN_GUILD_ID", "abc")]),
            Err(ConfigError::Invalid { name: "MAIN_GUILD_ID", .. })
        );
        assert_matches!(
            config(&[("DISCORD_TOKEN", "t"), ("LEVELING_CHANNEL_ID", "0")]),
            Err(ConfigError::Invalid { name: "LEVELING_CHANNEL_ID", .. })
        );
        assert_matches!(
            config(&[("DISCORD_TOKEN", "t"), ("SONG_DOWNLOAD_TIMEOUT", "soon")]),
            Err(ConfigError::Invalid { name: "SONG_DOWNLOAD_TIMEOUT", .. })
        );
        assert_matches!(
            config(&[("DISCORD_TOKEN", "t"), ("SONG_DOWNLOAD_TIMEOUT", "0s")]),
            Err(ConfigError::Invalid { name: "SONG_DOWNLOAD_TIMEOUT", .. })
        );
    }
}
