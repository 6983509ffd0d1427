//! Cross-game aggregate profile: experience, level, and the global
//! daily check-in streak.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Experience points per level.
pub const XP_PER_LEVEL: u64 = 1000;

/// One aggregate profile per learner, created lazily at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateProfile {
    pub learner_id: String,
    pub xp: u64,
    pub level: u32,
    /// Consecutive-day streak across the whole platform, advanced only on
    /// coin-bearing rewards.
    pub daily_streak: u32,
    pub last_check_in: Option<NaiveDate>,
}

impl AggregateProfile {
    pub fn new(learner_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            xp: 0,
            level: 1,
            daily_streak: 0,
            last_check_in: None,
        }
    }

    /// XP only ever grows; the level is recomputed on every grant.
    pub fn grant_xp(&mut self, amount: u64) {
        self.xp += amount;
        self.level = (self.xp / XP_PER_LEVEL) as u32 + 1;
    }

    /// Advance the global daily streak for a check-in on `today`.
    /// Exactly-one-day gap increments, a longer gap resets to 1, a repeat
    /// check-in the same day is a no-op.
    pub fn check_in(&mut self, today: NaiveDate) {
        match self.last_check_in {
            Some(last) if last == today => return,
            Some(last) if today.signed_duration_since(last).num_days() == 1 => {
                self.daily_streak += 1;
            }
            _ => self.daily_streak = 1,
        }
        self.last_check_in = Some(today);
    }
}
