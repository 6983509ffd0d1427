//! Access gate: age eligibility and subscription gating, combined into one
//! allow/deny decision. Checked before completion and before replay unlock.

use chrono::NaiveDate;

use ludus_common::{DenialReason, GameDefinition, Learner, LudusError};

/// Age rule. Missing birth date on an age-banded game is a retryable
/// "complete your profile" denial; an unbanded game is ungated legacy
/// content and passes.
pub fn check_age(learner: &Learner, game: &GameDefinition, today: NaiveDate) -> Result<(), LudusError> {
    let Some(band) = game.age_band else {
        return Ok(());
    };
    let Some(tier) = learner.age_tier(today) else {
        return Err(LudusError::denied(
            DenialReason::AgeIncompleteProfile,
            "Add a birth date to your profile to play this game",
        ));
    };
    if tier.allows(band) {
        Ok(())
    } else {
        Err(LudusError::denied(
            DenialReason::AgeRestricted,
            "This game is not available for your age group",
        ))
    }
}

/// Subscription rule. Full-access plans bypass the check; pending plans are
/// gated as free. Free plans may start at most `games_allowed` distinct games
/// per pillar; a game already started never counts against the cap again.
pub fn check_subscription(
    learner: &Learner,
    games_started_in_pillar: u32,
    already_started: bool,
    games_allowed: u32,
) -> Result<(), LudusError> {
    if learner.plan.has_full_access() || already_started {
        return Ok(());
    }
    if games_started_in_pillar >= games_allowed {
        return Err(LudusError::AccessDenied {
            reason: DenialReason::SubscriptionRestricted,
            message: format!(
                "Free plan includes {games_allowed} games per category; upgrade to keep playing"
            ),
            games_allowed: Some(games_allowed),
        });
    }
    Ok(())
}

/// Combined gate for game completion.
pub fn check_completion(
    learner: &Learner,
    game: &GameDefinition,
    today: NaiveDate,
    games_started_in_pillar: u32,
    already_started: bool,
    games_allowed: u32,
) -> Result<(), LudusError> {
    check_age(learner, game, today)?;
    check_subscription(learner, games_started_in_pillar, already_started, games_allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludus_common::{AgeBand, SubscriptionPlan};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn game(band: Option<AgeBand>) -> GameDefinition {
        let mut g = GameDefinition::new("finance-kids-1");
        g.age_band = band;
        g
    }

    fn learner_born(year: i32) -> Learner {
        let mut l = Learner::new("l1");
        l.date_of_birth = NaiveDate::from_ymd_opt(year, 1, 1);
        l
    }

    #[test]
    fn test_child_denied_adults_game() {
        let err = check_age(&learner_born(2016), &game(Some(AgeBand::Adults)), today()).unwrap_err();
        match err {
            LudusError::AccessDenied { reason, .. } => {
                assert_eq!(reason, DenialReason::AgeRestricted)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_dob_denied_only_for_banded_games() {
        let anonymous = Learner::new("l1");
        let err = check_age(&anonymous, &game(Some(AgeBand::Kids)), today()).unwrap_err();
        match err {
            LudusError::AccessDenied { reason, .. } => {
                assert_eq!(reason, DenialReason::AgeIncompleteProfile)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_age(&anonymous, &game(None), today()).is_ok());
    }

    #[test]
    fn test_unbanded_game_fails_open() {
        assert!(check_age(&learner_born(2016), &game(None), today()).is_ok());
    }

    #[test]
    fn test_free_plan_pillar_cap() {
        let free = Learner::new("l1");
        assert!(check_subscription(&free, 4, false, 5).is_ok());
        let err = check_subscription(&free, 5, false, 5).unwrap_err();
        match err {
            LudusError::AccessDenied {
                reason,
                games_allowed,
                ..
            } => {
                assert_eq!(reason, DenialReason::SubscriptionRestricted);
                assert_eq!(games_allowed, Some(5));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_already_started_game_bypasses_cap() {
        let free = Learner::new("l1");
        assert!(check_subscription(&free, 9, true, 5).is_ok());
    }

    #[test]
    fn test_full_access_bypasses_cap() {
        let mut l = Learner::new("l1");
        l.plan = SubscriptionPlan::FullAccess;
        assert!(check_subscription(&l, 50, false, 5).is_ok());
    }

    #[test]
    fn test_pending_plan_gated_as_free() {
        let mut l = Learner::new("l1");
        l.plan = SubscriptionPlan::Pending;
        assert!(check_subscription(&l, 5, false, 5).is_err());
    }
}
