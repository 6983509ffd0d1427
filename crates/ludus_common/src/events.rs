//! Outbound notification contract.
//!
//! The core only produces payloads; delivery is owned by whatever sink is
//! injected. Publishing must never block or fail a request.

use serde::{Deserialize, Serialize};

/// Capability for pushing structured notifications toward the UI and
/// dashboards. Injected into the daemon, never looked up from ambient state.
pub trait EventNotifier: Send + Sync {
    fn publish(&self, topic: &str, payload: serde_json::Value);
}

pub const TOPIC_GAME_COMPLETED: &str = "game-completed";
pub const TOPIC_GAME_REPLAYED: &str = "game-replayed";
pub const TOPIC_WALLET_UPDATED: &str = "wallet:updated";
pub const TOPIC_BADGE_EARNED: &str = "badge-earned";
pub const TOPIC_ACHIEVEMENT_EARNED: &str = "achievement-earned";
pub const TOPIC_LEADERBOARD_REFRESH: &str = "leaderboard:refresh";
pub const TOPIC_DASHBOARD_UPDATE: &str = "dashboard:update";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameCompletedEvent {
    pub learner_id: String,
    pub game_id: String,
    pub coins_earned: u64,
    pub xp_earned: u64,
    pub fully_completed: bool,
    pub new_balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReplayedEvent {
    pub learner_id: String,
    pub game_id: String,
    pub score: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdatedEvent {
    pub learner_id: String,
    pub balance: u64,
    /// Signed change that produced this balance.
    pub delta: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeEarnedEvent {
    pub learner_id: String,
    pub game_id: String,
    pub badge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementEarnedEvent {
    pub learner_id: String,
    pub game_id: String,
    pub achievement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRefreshEvent {
    pub learner_id: String,
    pub game_id: String,
}

/// Tenant-scoped signal for organization dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpdateEvent {
    pub tenant: String,
    pub learner_id: String,
    pub game_id: String,
    pub event: String,
}
