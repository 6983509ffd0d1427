//! Per-(learner, game) progress record and its play-state machine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

use crate::catalog::BadgeMeta;

/// How many applied idempotency keys each record remembers.
const APPLIED_KEY_WINDOW: usize = 32;

/// Explicit play state for one (learner, game) pair.
///
/// `FullyCompleted` means completed and replay never purchased;
/// `ReplayLocked` means a purchased replay was consumed. Both count as
/// completed for gating purposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    #[default]
    NotStarted,
    InProgress,
    FullyCompleted,
    ReplayUnlocked,
    ReplayLocked,
}

impl PlayState {
    pub fn fully_completed(&self) -> bool {
        !matches!(self, PlayState::NotStarted | PlayState::InProgress)
    }

    pub fn replay_unlocked(&self) -> bool {
        matches!(self, PlayState::ReplayUnlocked)
    }
}

/// One append-only entry of the per-game coin history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinGrant {
    pub amount: u64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Badge awarded for a game, at most once per learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeAward {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub awarded_at: DateTime<Utc>,
}

/// Progress record for one learner on one game. Created on first play,
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameProgress {
    pub game_id: String,
    pub state: PlayState,
    pub levels_completed: u32,
    pub total_levels: u32,
    pub highest_score: u64,
    pub max_score: u64,
    pub total_time_played_secs: u64,
    pub total_coins_earned: u64,
    #[serde(default)]
    pub coins_history: Vec<CoinGrant>,
    pub first_completed_at: Option<DateTime<Utc>>,
    pub last_played_at: Option<DateTime<Utc>>,
    /// Consecutive-day streak for this game alone.
    pub current_streak: u32,
    pub last_streak_date: Option<NaiveDate>,
    pub replay_unlocked_at: Option<DateTime<Utc>>,
    pub badge: Option<BadgeAward>,
    #[serde(default)]
    pub achievements: BTreeSet<String>,
    /// Recently applied idempotency keys, oldest first.
    #[serde(default)]
    applied_keys: VecDeque<String>,
}

impl GameProgress {
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            ..Default::default()
        }
    }

    pub fn badge_awarded(&self) -> bool {
        self.badge.is_some()
    }

    /// Fold one submission into the high-water marks and play clock.
    /// Marks never decrease; play time accumulates.
    pub fn record_play(
        &mut self,
        levels_completed: u32,
        total_levels: u32,
        score: u64,
        max_score: u64,
        time_played_secs: u64,
        now: DateTime<Utc>,
    ) {
        self.levels_completed = self.levels_completed.max(levels_completed);
        self.total_levels = self.total_levels.max(total_levels);
        self.highest_score = self.highest_score.max(score);
        self.max_score = self.max_score.max(max_score);
        self.total_time_played_secs += time_played_secs;
        self.touch_streak(now.date_naive());
        self.last_played_at = Some(now);
        if self.state == PlayState::NotStarted {
            self.state = PlayState::InProgress;
        }
    }

    /// Per-game daily streak: a gap of exactly one day increments, a longer
    /// gap resets to 1, same-day plays leave it untouched.
    fn touch_streak(&mut self, today: NaiveDate) {
        match self.last_streak_date {
            Some(last) if last == today => return,
            Some(last) if today.signed_duration_since(last).num_days() == 1 => {
                self.current_streak += 1;
            }
            _ => self.current_streak = 1,
        }
        self.last_streak_date = Some(today);
    }

    /// Transition into the completed family of states. Happens exactly once;
    /// later calls are no-ops.
    pub fn mark_fully_completed(&mut self, now: DateTime<Utc>) {
        if self.state.fully_completed() {
            return;
        }
        self.state = PlayState::FullyCompleted;
        self.first_completed_at = Some(now);
    }

    pub fn unlock_replay(&mut self, now: DateTime<Utc>) {
        self.state = PlayState::ReplayUnlocked;
        self.replay_unlocked_at = Some(now);
    }

    /// A played replay always re-locks; the next one must be purchased again.
    pub fn relock_replay(&mut self) {
        if self.state == PlayState::ReplayUnlocked {
            self.state = PlayState::ReplayLocked;
        }
    }

    pub fn grant_coins(&mut self, amount: u64, reason: impl Into<String>, now: DateTime<Utc>) {
        self.total_coins_earned += amount;
        self.coins_history.push(CoinGrant {
            amount,
            reason: reason.into(),
            timestamp: now,
        });
    }

    /// Wipe the coin total and history. Integrity repair only.
    pub fn reset_coin_history(&mut self) {
        self.total_coins_earned = 0;
        self.coins_history.clear();
    }

    pub fn award_badge(&mut self, meta: &BadgeMeta, now: DateTime<Utc>) -> bool {
        if self.badge.is_some() {
            return false;
        }
        self.badge = Some(BadgeAward {
            name: meta.name.clone(),
            image: meta.image.clone(),
            awarded_at: now,
        });
        true
    }

    /// Merge submitted achievement names, returning the ones not seen before.
    pub fn merge_achievements(&mut self, names: &[String]) -> Vec<String> {
        let mut fresh = Vec::new();
        for name in names {
            if name.is_empty() {
                continue;
            }
            if self.achievements.insert(name.clone()) {
                fresh.push(name.clone());
            }
        }
        fresh
    }

    pub fn has_applied_key(&self, key: &str) -> bool {
        self.applied_keys.iter().any(|k| k == key)
    }

    pub fn remember_applied_key(&mut self, key: impl Into<String>) {
        self.applied_keys.push_back(key.into());
        while self.applied_keys.len() > APPLIED_KEY_WINDOW {
            self.applied_keys.pop_front();
        }
    }
}
