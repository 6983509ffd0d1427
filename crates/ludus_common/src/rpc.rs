//! Wire contracts served by the daemon. Field names are camelCase on the
//! wire, matching the UI event stream the platform already speaks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::catalog::BadgeMeta;
use crate::error::{DenialReason, LudusError};
use crate::learner::SubscriptionPlan;
use crate::progress::{GameProgress, PlayState};
use crate::wallet::{Direction, Transaction};

/// Completion submission for one play-through of a game.
///
/// `score` is the coins-equivalent performance achieved in the run; a run
/// with every sub-question answered correctly reaches the game's declared
/// coin total.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompleteGameRequest {
    pub score: u64,
    #[serde(default)]
    pub time_played_secs: u64,
    #[serde(default)]
    pub levels_completed: Option<u32>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub is_full_completion: bool,
    /// Reward hints for legacy content whose catalog rows omit them; the
    /// catalog wins whenever it declares a value.
    #[serde(default)]
    pub total_coins: Option<u64>,
    #[serde(default)]
    pub coins_per_level: Option<u64>,
    #[serde(default)]
    pub total_xp: Option<u64>,
    #[serde(default)]
    pub is_replay: bool,
    /// Client-chosen key; resubmissions with the same key are no-ops.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Outcome of a completion submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteGameResponse {
    pub coins_earned: u64,
    pub xp_earned: u64,
    pub total_coins_earned: u64,
    pub fully_completed: bool,
    pub all_answers_correct: bool,
    pub is_replay: bool,
    pub replay_unlocked: bool,
    pub badge_earned: bool,
    pub badge_already_earned: bool,
    pub new_balance: u64,
    /// Global daily streak after this submission.
    pub streak: u32,
    pub level: u32,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub game_streak: u32,
    pub achievements: Vec<String>,
}

/// Outcome of a replay-unlock purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockReplayResponse {
    pub replay_unlocked: bool,
    pub new_balance: u64,
    /// Zero when the unlock was already held (idempotent re-request).
    pub coins_spent: u64,
}

/// Progress snapshot as served to clients. Zeroed defaults when the learner
/// has never touched the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub game_id: String,
    pub state: PlayState,
    pub levels_completed: u32,
    pub total_levels: u32,
    pub highest_score: u64,
    pub max_score: u64,
    pub total_time_played_secs: u64,
    pub total_coins_earned: u64,
    pub fully_completed: bool,
    pub replay_unlocked: bool,
    pub current_streak: u32,
    pub first_completed_at: Option<DateTime<Utc>>,
    pub last_played_at: Option<DateTime<Utc>>,
    pub badge_awarded: bool,
    pub badge: Option<BadgeMeta>,
    pub achievements: Vec<String>,
}

impl From<&GameProgress> for ProgressView {
    fn from(p: &GameProgress) -> Self {
        Self {
            game_id: p.game_id.clone(),
            state: p.state,
            levels_completed: p.levels_completed,
            total_levels: p.total_levels,
            highest_score: p.highest_score,
            max_score: p.max_score,
            total_time_played_secs: p.total_time_played_secs,
            total_coins_earned: p.total_coins_earned,
            fully_completed: p.state.fully_completed(),
            replay_unlocked: p.state.replay_unlocked(),
            current_streak: p.current_streak,
            first_completed_at: p.first_completed_at,
            last_played_at: p.last_played_at,
            badge_awarded: p.badge_awarded(),
            badge: p.badge.as_ref().map(|b| BadgeMeta {
                name: b.name.clone(),
                image: b.image.clone(),
            }),
            achievements: p.achievements.iter().cloned().collect(),
        }
    }
}

/// Wallet snapshot with the most recent transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub learner_id: String,
    pub balance: u64,
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub direction: Direction,
    pub amount: u64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            direction: tx.direction,
            amount: tx.amount,
            reason: tx.reason.clone(),
            timestamp: tx.timestamp,
        }
    }
}

/// Time window for leaderboard aggregation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LeaderboardPeriod {
    Daily,
    Weekly,
    Monthly,
    AllTime,
}

impl FromStr for LeaderboardPeriod {
    type Err = LudusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(LeaderboardPeriod::Daily),
            "weekly" => Ok(LeaderboardPeriod::Weekly),
            "monthly" => Ok(LeaderboardPeriod::Monthly),
            "all-time" | "alltime" => Ok(LeaderboardPeriod::AllTime),
            other => Err(LudusError::Validation(format!(
                "unknown leaderboard period: {other}"
            ))),
        }
    }
}

/// One leaderboard row. Derived on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub learner_id: String,
    pub display_name: String,
    pub total_score: u64,
    pub games_played: u32,
    pub total_time_played_secs: u64,
    pub last_played_at: DateTime<Utc>,
}

/// Learner profile upsert payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LearnerUpsert {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub plan: Option<SubscriptionPlan>,
}

/// Daemon health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub games_in_catalog: usize,
    pub learners_tracked: usize,
}

/// Error body returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: i32,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games_allowed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u64>,
}

impl ErrorBody {
    pub fn from_error(err: &LudusError) -> Self {
        let mut body = Self {
            code: err.code(),
            error: err.to_string(),
            reason: None,
            games_allowed: None,
            required: None,
            available: None,
        };
        match err {
            LudusError::AccessDenied {
                reason,
                games_allowed,
                ..
            } => {
                body.reason = Some(*reason);
                body.games_allowed = *games_allowed;
            }
            LudusError::InsufficientBalance {
                required,
                available,
            } => {
                body.required = Some(*required);
                body.available = Some(*available);
            }
            _ => {}
        }
        body
    }
}
