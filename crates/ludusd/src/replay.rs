//! Replay economy: tiered pricing and the unlock flow.
//!
//! Replay of a fully-completed game is reward-free and must be purchased;
//! each purchase covers a single replay.

use chrono::Utc;
use tracing::info;

use ludus_common::events::{WalletUpdatedEvent, TOPIC_WALLET_UPDATED};
use ludus_common::rpc::UnlockReplayResponse;
use ludus_common::{GameProgress, LudusError};

use crate::access;
use crate::completion::emit_dashboard_update;
use crate::notifier::emit;
use crate::state::AppState;

/// Tiered replay cost keyed by the game's ordinal within its pillar.
/// An unknown ordinal (0) prices as the first tier.
pub fn replay_price(ordinal: u32) -> u64 {
    match ordinal.max(1) {
        1..=25 => 2,
        26..=50 => 4,
        51..=75 => 6,
        _ => 8,
    }
}

/// Purchase a single replay of a fully-completed game.
///
/// Idempotent: re-requesting while the unlock is still unused succeeds
/// without charging again.
pub async fn unlock_replay(
    state: &AppState,
    learner_id: &str,
    game_id: &str,
) -> Result<UnlockReplayResponse, LudusError> {
    let game = state
        .catalog
        .get(game_id)
        .cloned()
        .ok_or_else(|| LudusError::GameNotFound(game_id.to_string()))?;

    let _guard = state.lock_pair(learner_id, game_id).await;
    let now = Utc::now();

    let mut progress = state
        .progress
        .read()
        .await
        .get(learner_id, game_id)
        .cloned()
        .unwrap_or_else(|| GameProgress::new(game_id));

    if !progress.state.fully_completed() {
        return Err(LudusError::Validation(format!(
            "{game_id} is not fully completed yet"
        )));
    }
    if progress.state.replay_unlocked() {
        return Ok(UnlockReplayResponse {
            replay_unlocked: true,
            new_balance: state.wallets.read().await.balance_of(learner_id),
            coins_spent: 0,
        });
    }

    let learner = state.learners.read().await.get_or_default(learner_id);
    let (started, already_started) = state.pillar_usage(learner_id, &game.pillar, game_id).await;
    access::check_subscription(
        &learner,
        started,
        already_started,
        state.config.free_games_per_pillar,
    )?;

    let price = replay_price(game.ordinal);
    let reason = format!("Replay unlock: {}", game.id);
    let new_balance = {
        let mut wallets = state.wallets.write().await;
        let wallet = wallets.get_or_create(learner_id);
        wallet.debit(price, reason.clone(), now)?;
        wallet.balance
    };

    progress.unlock_replay(now);
    state.progress.write().await.upsert(learner_id, progress);
    state.persist().await;

    info!(%learner_id, %game_id, price, "Replay unlocked");

    emit(
        state.notifier.as_ref(),
        TOPIC_WALLET_UPDATED,
        &WalletUpdatedEvent {
            learner_id: learner_id.to_string(),
            balance: new_balance,
            delta: -(price as i64),
            reason,
        },
    );
    emit_dashboard_update(state, &learner, game_id, "replay-unlocked");

    Ok(UnlockReplayResponse {
        replay_unlocked: true,
        new_balance,
        coins_spent: price,
    })
}
