//! The leveling curve and the per-user message cooldown.

use dashmap::{DashMap, mapref::entry::Entry};
use serenity::all::UserId;
use std::time::{Duration, Instant};

pub const BASE_XP: u64 = 100;
pub const LEVEL_MULTIPLIER: f64 = 1.5;

/// XP awarded for a counted message.
pub const MESSAGE_XP: u64 = 5;
/// Only one message per window earns XP.
pub const MESSAGE_COOLDOWN: Duration = Duration::from_secs(5);

/// Total XP needed to reach `level`. Level 1 starts at 0.
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    // (level - 1)^1.5 as n * sqrt(n), exact for perfect squares.
    let n = f64::from(level - 1);
    (BASE_XP as f64 * n * n.sqrt()).floor() as u64
}

pub fn level_for_xp(xp: u64) -> u32 {
    let estimate = ((xp as f64 / BASE_XP as f64).powf(1.0 / LEVEL_MULTIPLIER)).floor() as u32 + 1;

    // The float estimate can land one off at exact thresholds; settle on the
    // level whose range contains `xp` according to xp_for_level.
    let mut level = estimate.max(1);
    while level > 1 && xp < xp_for_level(level) {
        level -= 1;
    }
    while xp >= xp_for_level(level + 1) {
        level += 1;
    }
    level
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: u32,
    /// XP earned since reaching `level`.
    pub relative_xp: u64,
    /// XP between `level` and the next one.
    pub xp_for_next_level: u64,
}

impl LevelInfo {
    pub fn remaining(&self) -> u64 {
        self.xp_for_next_level.saturating_sub(self.relative_xp)
    }
}

pub fn level_info(xp: u64) -> LevelInfo {
    let level = level_for_xp(xp);
    let floor = xp_for_level(level);
    LevelInfo {
        level,
        relative_xp: xp - floor,
        xp_for_next_level: xp_for_level(level + 1) - floor,
    }
}

/// Remembers when each user last earned XP.
#[derive(Debug, Default)]
pub struct XpCooldown {
    window: Duration,
    last_award: DashMap<UserId, Instant>,
}

impl XpCooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_award: DashMap::new(),
        }
    }

    /// Claims the user's slot for the current window. Returns `false` if
    /// they already earned XP within it.
    pub fn try_claim(&self, user_id: UserId, now: Instant) -> bool {
        match self.last_award.entry(user_id) {
            Entry::Occupied(mut last) => {
                if now.duration_since(*last.get()) < self.window {
                    return false;
                }
                last.insert(now);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }
}
