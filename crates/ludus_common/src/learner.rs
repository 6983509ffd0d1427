//! Learner identity, age tiers, and subscription plans.
//!
//! Age is always derived from the birth date, never stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::AgeBand;

/// Subscription plan as recorded on the learner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    FullAccess,
    /// Awaiting payment confirmation; gated as the free plan.
    Pending,
}

impl SubscriptionPlan {
    pub fn has_full_access(&self) -> bool {
        matches!(self, SubscriptionPlan::FullAccess)
    }
}

/// A platform learner. Created lazily with defaults when first seen.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Learner {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// Organization the learner belongs to, used for dashboard scoping.
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub plan: SubscriptionPlan,
}

impl Learner {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn age_tier(&self, today: NaiveDate) -> Option<AgeTier> {
        let dob = self.date_of_birth?;
        Some(AgeTier::from_age(today.years_since(dob).unwrap_or(0)))
    }
}

/// Age tier derived from learner age.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgeTier {
    Kids,
    Teens,
    YoungAdult,
    Adults,
}

impl AgeTier {
    /// Fixed tier boundaries: <=12 kids, <=17 teens, <=23 young-adult.
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=12 => AgeTier::Kids,
            13..=17 => AgeTier::Teens,
            18..=23 => AgeTier::YoungAdult,
            _ => AgeTier::Adults,
        }
    }

    /// Tier-to-band adjacency. Every tier allows its own band; kids and
    /// teens overlap in both directions, as do teens and young-adult.
    pub fn allows(&self, band: AgeBand) -> bool {
        match self {
            AgeTier::Kids => matches!(band, AgeBand::Kids | AgeBand::Teens),
            AgeTier::Teens => {
                matches!(band, AgeBand::Kids | AgeBand::Teens | AgeBand::YoungAdult)
            }
            AgeTier::YoungAdult => matches!(band, AgeBand::Teens | AgeBand::YoungAdult),
            AgeTier::Adults => matches!(band, AgeBand::Adults),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(AgeTier::from_age(8), AgeTier::Kids);
        assert_eq!(AgeTier::from_age(12), AgeTier::Kids);
        assert_eq!(AgeTier::from_age(13), AgeTier::Teens);
        assert_eq!(AgeTier::from_age(17), AgeTier::Teens);
        assert_eq!(AgeTier::from_age(18), AgeTier::YoungAdult);
        assert_eq!(AgeTier::from_age(23), AgeTier::YoungAdult);
        assert_eq!(AgeTier::from_age(24), AgeTier::Adults);
    }

    #[test]
    fn test_adjacency() {
        assert!(AgeTier::Kids.allows(AgeBand::Teens));
        assert!(AgeTier::Teens.allows(AgeBand::Kids));
        assert!(AgeTier::Teens.allows(AgeBand::YoungAdult));
        assert!(!AgeTier::Kids.allows(AgeBand::Adults));
        assert!(!AgeTier::Adults.allows(AgeBand::Kids));
        assert!(AgeTier::Adults.allows(AgeBand::Adults));
    }

    #[test]
    fn test_age_tier_from_dob() {
        let mut learner = Learner::new("l1");
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(learner.age_tier(today), None);

        learner.date_of_birth = NaiveDate::from_ymd_opt(2016, 1, 15);
        assert_eq!(learner.age_tier(today), Some(AgeTier::Kids));
    }

    #[test]
    fn test_pending_plan_is_not_full_access() {
        assert!(!SubscriptionPlan::Pending.has_full_access());
        assert!(SubscriptionPlan::FullAccess.has_full_access());
    }
}
