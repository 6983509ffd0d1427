//! Access gate tests
//!
//! Age and subscription gating as seen through the completion flow.

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use ludus_common::rpc::CompleteGameRequest;
use ludus_common::{
    DenialReason, GameCatalog, GameDefinition, Learner, LudusError, SubscriptionPlan,
};
use ludusd::completion::complete_game;
use ludusd::config::LudusConfig;
use ludusd::notifier::NullNotifier;
use ludusd::state::AppState;
use ludusd::store::Stores;

fn state_with(games: Vec<GameDefinition>) -> (TempDir, AppState) {
    let dir = TempDir::new().unwrap();
    let config = LudusConfig {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let state = AppState::new(
        config,
        GameCatalog::from_entries(games),
        Stores::default(),
        Arc::new(NullNotifier),
    );
    (dir, state)
}

fn full_run(score: u64) -> CompleteGameRequest {
    CompleteGameRequest {
        score,
        is_full_completion: true,
        ..Default::default()
    }
}

async fn seed_learner(state: &AppState, learner: Learner) {
    state.learners.write().await.upsert(learner);
}

fn denial_reason(err: LudusError) -> DenialReason {
    match err {
        LudusError::AccessDenied { reason, .. } => reason,
        other => panic!("expected access denial, got {other}"),
    }
}

#[tokio::test]
async fn test_child_denied_adults_game() {
    let (_dir, state) = state_with(vec![GameDefinition::new("taxes-adults-1")]);
    let mut learner = Learner::new("kid");
    learner.date_of_birth = NaiveDate::from_ymd_opt(2018, 3, 1);
    seed_learner(&state, learner).await;

    let err = complete_game(&state, "kid", "taxes-adults-1", full_run(5))
        .await
        .unwrap_err();
    assert_eq!(denial_reason(err), DenialReason::AgeRestricted);
}

#[tokio::test]
async fn test_kid_allowed_on_teens_game() {
    let (_dir, state) = state_with(vec![GameDefinition::new("brain-teens-1")]);
    let mut learner = Learner::new("kid");
    learner.date_of_birth = NaiveDate::from_ymd_opt(2018, 3, 1);
    seed_learner(&state, learner).await;

    assert!(complete_game(&state, "kid", "brain-teens-1", full_run(5))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_unknown_birth_date_denied_on_banded_game_only() {
    let (_dir, state) = state_with(vec![
        GameDefinition::new("finance-kids-1"),
        GameDefinition::new("counting-7"),
    ]);

    let err = complete_game(&state, "anon", "finance-kids-1", full_run(5))
        .await
        .unwrap_err();
    assert_eq!(denial_reason(err), DenialReason::AgeIncompleteProfile);

    // No age band on the game: legacy content fails open.
    assert!(complete_game(&state, "anon", "counting-7", full_run(5))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_free_plan_denied_sixth_game_in_pillar() {
    let games: Vec<GameDefinition> = (1..=6)
        .map(|i| GameDefinition::new(format!("finance-{i}")))
        .collect();
    let (_dir, state) = state_with(games);

    for i in 1..=5 {
        complete_game(&state, "l1", &format!("finance-{i}"), full_run(5))
            .await
            .unwrap();
    }

    let err = complete_game(&state, "l1", "finance-6", full_run(5))
        .await
        .unwrap_err();
    match err {
        LudusError::AccessDenied {
            reason,
            games_allowed,
            ..
        } => {
            assert_eq!(reason, DenialReason::SubscriptionRestricted);
            assert_eq!(games_allowed, Some(5));
        }
        other => panic!("expected subscription denial, got {other}"),
    }
}

#[tokio::test]
async fn test_game_already_started_stays_playable_at_the_cap() {
    let games: Vec<GameDefinition> = (1..=5)
        .map(|i| GameDefinition::new(format!("finance-{i}")))
        .collect();
    let (_dir, state) = state_with(games);

    for i in 1..=5 {
        complete_game(&state, "l1", &format!("finance-{i}"), full_run(5))
            .await
            .unwrap();
    }

    // At the cap, but finance-3 is already among the started games.
    assert!(complete_game(&state, "l1", "finance-3", full_run(5))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cap_is_per_pillar() {
    let mut games: Vec<GameDefinition> = (1..=5)
        .map(|i| GameDefinition::new(format!("finance-{i}")))
        .collect();
    games.push(GameDefinition::new("brain-1"));
    let (_dir, state) = state_with(games);

    for i in 1..=5 {
        complete_game(&state, "l1", &format!("finance-{i}"), full_run(5))
            .await
            .unwrap();
    }

    // A different pillar has its own allowance.
    assert!(complete_game(&state, "l1", "brain-1", full_run(5))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_full_access_plan_bypasses_the_cap() {
    let games: Vec<GameDefinition> = (1..=6)
        .map(|i| GameDefinition::new(format!("finance-{i}")))
        .collect();
    let (_dir, state) = state_with(games);

    let mut learner = Learner::new("vip");
    learner.plan = SubscriptionPlan::FullAccess;
    seed_learner(&state, learner).await;

    for i in 1..=6 {
        complete_game(&state, "vip", &format!("finance-{i}"), full_run(5))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_pending_subscription_gated_as_free() {
    let games: Vec<GameDefinition> = (1..=6)
        .map(|i| GameDefinition::new(format!("finance-{i}")))
        .collect();
    let (_dir, state) = state_with(games);

    let mut learner = Learner::new("pending");
    learner.plan = SubscriptionPlan::Pending;
    seed_learner(&state, learner).await;

    for i in 1..=5 {
        complete_game(&state, "pending", &format!("finance-{i}"), full_run(5))
            .await
            .unwrap();
    }
    let err = complete_game(&state, "pending", "finance-6", full_run(5))
        .await
        .unwrap_err();
    assert_eq!(denial_reason(err), DenialReason::SubscriptionRestricted);
}
