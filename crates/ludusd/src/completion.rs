//! Game-completion flow: gate, reward, ledger updates, notifications.
//!
//! The whole read-modify-write runs under the (learner, game) pair lock, so
//! duplicate or concurrent submissions for the same pair serialize. All
//! progress mutations are staged on a clone and committed in one store write.

use chrono::{DateTime, Utc};
use tracing::info;

use ludus_common::events::{
    AchievementEarnedEvent, BadgeEarnedEvent, DashboardUpdateEvent, GameCompletedEvent,
    GameReplayedEvent, LeaderboardRefreshEvent, WalletUpdatedEvent, TOPIC_ACHIEVEMENT_EARNED,
    TOPIC_BADGE_EARNED, TOPIC_DASHBOARD_UPDATE, TOPIC_GAME_COMPLETED, TOPIC_GAME_REPLAYED,
    TOPIC_LEADERBOARD_REFRESH, TOPIC_WALLET_UPDATED,
};
use ludus_common::rpc::{CompleteGameRequest, CompleteGameResponse};
use ludus_common::{GameDefinition, GameProgress, Learner, LudusError};

use crate::access;
use crate::notifier::emit;
use crate::rewards;
use crate::state::AppState;

/// Handle one completion submission for (learner, game).
pub async fn complete_game(
    state: &AppState,
    learner_id: &str,
    game_id: &str,
    req: CompleteGameRequest,
) -> Result<CompleteGameResponse, LudusError> {
    if learner_id.trim().is_empty() || game_id.trim().is_empty() {
        return Err(LudusError::Validation(
            "learner id and game id are required".to_string(),
        ));
    }
    let game = state
        .catalog
        .get(game_id)
        .cloned()
        .ok_or_else(|| LudusError::GameNotFound(game_id.to_string()))?;

    let _guard = state.lock_pair(learner_id, game_id).await;
    let now = Utc::now();

    let learner = state.learners.read().await.get_or_default(learner_id);
    let (started, already_started) = state.pillar_usage(learner_id, &game.pillar, game_id).await;
    access::check_completion(
        &learner,
        &game,
        now.date_naive(),
        started,
        already_started,
        state.config.free_games_per_pillar,
    )?;

    let mut progress = state
        .progress
        .read()
        .await
        .get(learner_id, game_id)
        .cloned()
        .unwrap_or_else(|| GameProgress::new(game_id));

    // Structural duplicate detection: a retried submission gets its
    // idempotent answer without touching any ledger.
    if let Some(key) = req.idempotency_key.as_deref() {
        if progress.has_applied_key(key) {
            info!(%learner_id, %game_id, key, "Duplicate submission, answering from current state");
            return Ok(zero_award_response(state, learner_id, &progress, &game, &req).await);
        }
    }

    let is_replay =
        req.is_replay || (progress.state.fully_completed() && progress.state.replay_unlocked());

    if is_replay {
        replay_submission(state, &learner, &game, progress, req, now).await
    } else {
        reward_submission(state, &learner, &game, progress, req, now).await
    }
}

/// First-class path: may award coins, XP, and a badge.
async fn reward_submission(
    state: &AppState,
    learner: &Learner,
    game: &GameDefinition,
    mut progress: GameProgress,
    req: CompleteGameRequest,
    now: DateTime<Utc>,
) -> Result<CompleteGameResponse, LudusError> {
    let outcome = rewards::evaluate(&mut progress, game, &req);

    progress.record_play(
        submitted_levels(&req, game, outcome.all_answers_correct),
        game.total_levels,
        req.score,
        outcome.target_coins,
        req.time_played_secs,
        now,
    );
    if req.is_full_completion && outcome.all_answers_correct {
        progress.mark_fully_completed(now);
    }

    let badge_already_earned = progress.badge_awarded();
    let badge_earned = match &outcome.badge_to_award {
        Some(meta) => progress.award_badge(meta, now),
        None => false,
    };
    let fresh_achievements = progress.merge_achievements(&req.achievements);
    if let Some(key) = &req.idempotency_key {
        progress.remember_applied_key(key.clone());
    }

    let reason = completion_reason(game);
    if outcome.coins_to_award > 0 {
        progress.grant_coins(outcome.coins_to_award, reason.clone(), now);
    }

    // Commit. Wallet and profile move only on coin-bearing rewards.
    let new_balance = if outcome.coins_to_award > 0 {
        let mut wallets = state.wallets.write().await;
        let wallet = wallets.get_or_create(&learner.id);
        wallet.credit(outcome.coins_to_award, reason.clone(), now);
        wallet.balance
    } else {
        state.wallets.read().await.balance_of(&learner.id)
    };

    let (streak, level, total_xp) = {
        let mut profiles = state.profiles.write().await;
        let profile = profiles.get_or_create(&learner.id);
        if outcome.coins_to_award > 0 {
            profile.grant_xp(outcome.xp_to_award);
            profile.check_in(now.date_naive());
        }
        (profile.daily_streak, profile.level, profile.xp)
    };

    state.progress.write().await.upsert(&learner.id, progress.clone());
    state.persist().await;

    info!(
        learner = %learner.id,
        game = %game.id,
        coins = outcome.coins_to_award,
        xp = outcome.xp_to_award,
        "Completion processed"
    );

    let notifier = state.notifier.as_ref();
    if outcome.coins_to_award > 0 {
        emit(
            notifier,
            TOPIC_WALLET_UPDATED,
            &WalletUpdatedEvent {
                learner_id: learner.id.clone(),
                balance: new_balance,
                delta: outcome.coins_to_award as i64,
                reason,
            },
        );
    }
    if badge_earned {
        if let Some(badge) = &progress.badge {
            emit(
                notifier,
                TOPIC_BADGE_EARNED,
                &BadgeEarnedEvent {
                    learner_id: learner.id.clone(),
                    game_id: game.id.clone(),
                    badge: badge.name.clone(),
                },
            );
        }
    }
    for achievement in &fresh_achievements {
        emit(
            notifier,
            TOPIC_ACHIEVEMENT_EARNED,
            &AchievementEarnedEvent {
                learner_id: learner.id.clone(),
                game_id: game.id.clone(),
                achievement: achievement.clone(),
            },
        );
    }
    emit(
        notifier,
        TOPIC_GAME_COMPLETED,
        &GameCompletedEvent {
            learner_id: learner.id.clone(),
            game_id: game.id.clone(),
            coins_earned: outcome.coins_to_award,
            xp_earned: outcome.xp_to_award,
            fully_completed: progress.state.fully_completed(),
            new_balance,
        },
    );
    emit(
        notifier,
        TOPIC_LEADERBOARD_REFRESH,
        &LeaderboardRefreshEvent {
            learner_id: learner.id.clone(),
            game_id: game.id.clone(),
        },
    );
    emit_dashboard_update(state, learner, &game.id, "game-completed");

    Ok(CompleteGameResponse {
        coins_earned: outcome.coins_to_award,
        xp_earned: outcome.xp_to_award,
        total_coins_earned: progress.total_coins_earned,
        fully_completed: progress.state.fully_completed(),
        all_answers_correct: outcome.all_answers_correct,
        is_replay: false,
        replay_unlocked: progress.state.replay_unlocked(),
        badge_earned,
        badge_already_earned,
        new_balance,
        streak,
        level,
        total_xp,
        game_streak: progress.current_streak,
        achievements: progress.achievements.iter().cloned().collect(),
    })
}

/// Replay path: high-water marks and streak move, rewards never do, and a
/// consumed unlock always re-locks.
async fn replay_submission(
    state: &AppState,
    learner: &Learner,
    game: &GameDefinition,
    mut progress: GameProgress,
    req: CompleteGameRequest,
    now: DateTime<Utc>,
) -> Result<CompleteGameResponse, LudusError> {
    let target = rewards::target_coins(game, &req);
    let all_answers_correct = target > 0 && req.score >= target;

    progress.record_play(
        submitted_levels(&req, game, all_answers_correct),
        game.total_levels,
        req.score,
        target,
        req.time_played_secs,
        now,
    );
    progress.relock_replay();
    let fresh_achievements = progress.merge_achievements(&req.achievements);
    if let Some(key) = &req.idempotency_key {
        progress.remember_applied_key(key.clone());
    }

    state.progress.write().await.upsert(&learner.id, progress.clone());
    state.persist().await;

    info!(learner = %learner.id, game = %game.id, "Replay processed, no reward");

    let notifier = state.notifier.as_ref();
    for achievement in &fresh_achievements {
        emit(
            notifier,
            TOPIC_ACHIEVEMENT_EARNED,
            &AchievementEarnedEvent {
                learner_id: learner.id.clone(),
                game_id: game.id.clone(),
                achievement: achievement.clone(),
            },
        );
    }
    emit(
        notifier,
        TOPIC_GAME_REPLAYED,
        &GameReplayedEvent {
            learner_id: learner.id.clone(),
            game_id: game.id.clone(),
            score: req.score,
        },
    );
    emit(
        notifier,
        TOPIC_LEADERBOARD_REFRESH,
        &LeaderboardRefreshEvent {
            learner_id: learner.id.clone(),
            game_id: game.id.clone(),
        },
    );
    emit_dashboard_update(state, learner, &game.id, "game-replayed");

    let snapshot = profile_snapshot(state, &learner.id).await;
    Ok(CompleteGameResponse {
        coins_earned: 0,
        xp_earned: 0,
        total_coins_earned: progress.total_coins_earned,
        fully_completed: progress.state.fully_completed(),
        all_answers_correct,
        is_replay: true,
        replay_unlocked: progress.state.replay_unlocked(),
        badge_earned: false,
        badge_already_earned: progress.badge_awarded(),
        new_balance: state.wallets.read().await.balance_of(&learner.id),
        streak: snapshot.0,
        level: snapshot.1,
        total_xp: snapshot.2,
        game_streak: progress.current_streak,
        achievements: progress.achievements.iter().cloned().collect(),
    })
}

/// Answer for a duplicate idempotency key: current state, nothing awarded.
async fn zero_award_response(
    state: &AppState,
    learner_id: &str,
    progress: &GameProgress,
    game: &GameDefinition,
    req: &CompleteGameRequest,
) -> CompleteGameResponse {
    let target = rewards::target_coins(game, req);
    let (streak, level, total_xp) = profile_snapshot(state, learner_id).await;
    CompleteGameResponse {
        coins_earned: 0,
        xp_earned: 0,
        total_coins_earned: progress.total_coins_earned,
        fully_completed: progress.state.fully_completed(),
        all_answers_correct: target > 0 && req.score >= target,
        is_replay: req.is_replay,
        replay_unlocked: progress.state.replay_unlocked(),
        badge_earned: false,
        badge_already_earned: progress.badge_awarded(),
        new_balance: state.wallets.read().await.balance_of(learner_id),
        streak,
        level,
        total_xp,
        game_streak: progress.current_streak,
        achievements: progress.achievements.iter().cloned().collect(),
    }
}

async fn profile_snapshot(state: &AppState, learner_id: &str) -> (u32, u32, u64) {
    let profiles = state.profiles.read().await;
    match profiles.get(learner_id) {
        Some(p) => (p.daily_streak, p.level, p.xp),
        None => (0, 1, 0),
    }
}

/// Levels to fold into the high-water marks. A full, all-correct run covers
/// every level even when the client omits the count.
fn submitted_levels(req: &CompleteGameRequest, game: &GameDefinition, all_correct: bool) -> u32 {
    match req.levels_completed {
        Some(levels) => levels,
        None if req.is_full_completion && all_correct => game.total_levels,
        None => 0,
    }
}

fn completion_reason(game: &GameDefinition) -> String {
    if game.title.is_empty() {
        format!("Completed {}", game.id)
    } else {
        format!("Completed {}", game.title)
    }
}

pub(crate) fn emit_dashboard_update(
    state: &AppState,
    learner: &Learner,
    game_id: &str,
    event: &str,
) {
    if let Some(tenant) = &learner.tenant {
        emit(
            state.notifier.as_ref(),
            TOPIC_DASHBOARD_UPDATE,
            &DashboardUpdateEvent {
                tenant: tenant.clone(),
                learner_id: learner.id.clone(),
                game_id: game_id.to_string(),
                event: event.to_string(),
            },
        );
    }
}
