//! Reward calculation for one completion event.
//!
//! Correctness target: the catalog-declared reward is earned exactly once,
//! on the first full, all-correct completion. Replays and partial runs earn
//! nothing. Records that show fullyCompleted with an incomplete reward (a
//! known historical inconsistency) are repaired by granting the shortfall,
//! never the full amount again.

use tracing::warn;

use ludus_common::catalog::DEFAULT_GAME_COINS;
use ludus_common::rpc::CompleteGameRequest;
use ludus_common::{BadgeMeta, GameDefinition, GameProgress};

/// Earned totals above this multiple of the target are treated as corrupt
/// and reset before computing awards. Last-resort circuit breaker; the
/// idempotency log in the completion flow is the structural defense.
const EARNED_TOTAL_CAP_FACTOR: u64 = 10;

/// What a completion submission grants.
#[derive(Debug, Clone, Default)]
pub struct RewardOutcome {
    pub target_coins: u64,
    pub all_answers_correct: bool,
    pub coins_to_award: u64,
    pub xp_to_award: u64,
    pub badge_to_award: Option<BadgeMeta>,
    /// True when the stored coin total was reset as corrupt.
    pub integrity_reset: bool,
}

/// Declared coin total for the game: catalog totalCoins, else coinsPerLevel,
/// else the fixed fallback. Request-supplied hints fill catalog gaps only.
pub fn target_coins(game: &GameDefinition, req: &CompleteGameRequest) -> u64 {
    game.total_coins
        .filter(|c| *c > 0)
        .or(req.total_coins.filter(|c| *c > 0))
        .unwrap_or_else(|| {
            if game.coins_per_level > 0 {
                game.coins_per_level
            } else {
                req.coins_per_level
                    .filter(|c| *c > 0)
                    .unwrap_or(DEFAULT_GAME_COINS)
            }
        })
}

fn declared_xp(game: &GameDefinition, req: &CompleteGameRequest) -> Option<u64> {
    game.total_xp
        .filter(|x| *x > 0)
        .or(req.total_xp.filter(|x| *x > 0))
}

/// Compute the award for one submission. May reset the progress record's
/// coin history when the stored total fails the sanity bound.
pub fn evaluate(
    progress: &mut GameProgress,
    game: &GameDefinition,
    req: &CompleteGameRequest,
) -> RewardOutcome {
    let target = target_coins(game, req);
    let all_answers_correct = target > 0 && req.score >= target;

    let mut integrity_reset = false;
    if progress.total_coins_earned > EARNED_TOTAL_CAP_FACTOR * target {
        warn!(
            game = %game.id,
            earned = progress.total_coins_earned,
            target,
            "Earned total exceeds sanity bound, resetting coin history"
        );
        progress.reset_coin_history();
        integrity_reset = true;
    }

    let has_earned_full = progress.total_coins_earned >= target;
    let award = req.is_full_completion
        && all_answers_correct
        && (!progress.state.fully_completed() || !has_earned_full);

    let coins_to_award = if !award {
        0
    } else if progress.state.fully_completed() && !has_earned_full {
        // Fully completed but under-rewarded: grant the shortfall only.
        target - progress.total_coins_earned
    } else {
        target
    };

    let xp_to_award = if coins_to_award == 0 {
        0
    } else {
        declared_xp(game, req).unwrap_or(2 * coins_to_award)
    };

    let badge_to_award = if req.is_full_completion
        && all_answers_correct
        && !progress.badge_awarded()
    {
        game.badge.clone()
    } else {
        None
    };

    RewardOutcome {
        target_coins: target,
        all_answers_correct,
        coins_to_award,
        xp_to_award,
        badge_to_award,
        integrity_reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn game() -> GameDefinition {
        let mut g = GameDefinition::new("finance-kids-41");
        g.total_coins = Some(5);
        g.total_xp = Some(10);
        g
    }

    fn full_run(score: u64) -> CompleteGameRequest {
        CompleteGameRequest {
            score,
            is_full_completion: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_full_completion_awards_declared_reward() {
        let mut p = GameProgress::new("finance-kids-41");
        let out = evaluate(&mut p, &game(), &full_run(5));
        assert!(out.all_answers_correct);
        assert_eq!(out.coins_to_award, 5);
        assert_eq!(out.xp_to_award, 10);
    }

    #[test]
    fn test_completed_and_fully_rewarded_earns_nothing() {
        let mut p = GameProgress::new("finance-kids-41");
        p.mark_fully_completed(Utc::now());
        p.grant_coins(5, "first run", Utc::now());
        let out = evaluate(&mut p, &game(), &full_run(5));
        assert_eq!(out.coins_to_award, 0);
        assert_eq!(out.xp_to_award, 0);
    }

    #[test]
    fn test_partial_completion_earns_nothing() {
        let mut p = GameProgress::new("finance-kids-41");
        let mut req = full_run(5);
        req.is_full_completion = false;
        let out = evaluate(&mut p, &game(), &req);
        assert_eq!(out.coins_to_award, 0);

        // All levels done but not every answer correct: also nothing.
        let out = evaluate(&mut p, &game(), &full_run(3));
        assert!(!out.all_answers_correct);
        assert_eq!(out.coins_to_award, 0);
    }

    #[test]
    fn test_under_rewarded_record_gets_the_shortfall() {
        let mut p = GameProgress::new("finance-kids-41");
        p.mark_fully_completed(Utc::now());
        p.grant_coins(2, "truncated grant", Utc::now());
        let out = evaluate(&mut p, &game(), &full_run(5));
        assert_eq!(out.coins_to_award, 3);
        // Declared XP applies to the repair as well.
        assert_eq!(out.xp_to_award, 10);
    }

    #[test]
    fn test_corrupt_total_is_reset_before_award() {
        let mut p = GameProgress::new("finance-kids-41");
        p.grant_coins(51, "duplicated grants", Utc::now());
        let out = evaluate(&mut p, &game(), &full_run(5));
        assert!(out.integrity_reset);
        assert_eq!(p.total_coins_earned, 0);
        assert!(p.coins_history.is_empty());
        assert_eq!(out.coins_to_award, 5);
    }

    #[test]
    fn test_target_falls_back_to_coins_per_level_then_constant() {
        let mut g = GameDefinition::new("brain-teens-2");
        g.coins_per_level = 3;
        let mut p = GameProgress::new("brain-teens-2");
        let out = evaluate(&mut p, &g, &full_run(3));
        assert_eq!(out.target_coins, 3);

        let bare = GameDefinition::new("brain-teens-3");
        let mut p = GameProgress::new("brain-teens-3");
        let out = evaluate(&mut p, &bare, &full_run(DEFAULT_GAME_COINS));
        assert_eq!(out.target_coins, DEFAULT_GAME_COINS);
        assert_eq!(out.coins_to_award, DEFAULT_GAME_COINS);
        // No declared XP: derived as twice the coins.
        assert_eq!(out.xp_to_award, 2 * DEFAULT_GAME_COINS);
    }

    #[test]
    fn test_request_hints_fill_catalog_gaps_only() {
        let mut g = game();
        g.total_coins = Some(8);
        let mut req = full_run(8);
        req.total_coins = Some(99);
        let mut p = GameProgress::new("finance-kids-41");
        let out = evaluate(&mut p, &g, &req);
        assert_eq!(out.target_coins, 8);

        let bare = GameDefinition::new("finance-kids-42");
        let mut req = full_run(7);
        req.total_coins = Some(7);
        let mut p = GameProgress::new("finance-kids-42");
        let out = evaluate(&mut p, &bare, &req);
        assert_eq!(out.target_coins, 7);
    }

    #[test]
    fn test_badge_granted_once_independent_of_coins() {
        let mut g = game();
        g.badge = Some(BadgeMeta {
            name: "Saver".to_string(),
            image: None,
        });
        // Already completed and fully rewarded: coins are zero, badge still
        // lands if it was never awarded.
        let mut p = GameProgress::new("finance-kids-41");
        p.mark_fully_completed(Utc::now());
        p.grant_coins(5, "first run", Utc::now());
        let out = evaluate(&mut p, &g, &full_run(5));
        assert_eq!(out.coins_to_award, 0);
        assert!(out.badge_to_award.is_some());

        p.award_badge(&g.badge.clone().unwrap(), Utc::now());
        let out = evaluate(&mut p, &g, &full_run(5));
        assert!(out.badge_to_award.is_none());
    }
}
