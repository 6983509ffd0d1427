//! Time-windowed leaderboard aggregation over progress records.
//!
//! Read-only; runs against whatever snapshot of the stores is current and
//! tolerates concurrent writes.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

use ludus_common::rpc::{LeaderboardEntry, LeaderboardPeriod};

use crate::state::AppState;
use crate::store::{LearnerStore, ProgressStore};

const LEADERBOARD_SIZE: usize = 10;

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

/// Inclusive lower bound of the aggregation window; None means all-time.
pub fn window_start(period: LeaderboardPeriod, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    match period {
        LeaderboardPeriod::Daily => Some(midnight(today)),
        LeaderboardPeriod::Weekly => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            Some(midnight(monday))
        }
        LeaderboardPeriod::Monthly => Some(midnight(today.with_day(1).unwrap_or(today))),
        LeaderboardPeriod::AllTime => None,
    }
}

/// Fold progress records into per-learner totals and rank them.
/// Ties keep the stable learner-id order of the fold.
pub fn aggregate(
    progress: &ProgressStore,
    learners: &LearnerStore,
    period: LeaderboardPeriod,
    now: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    let start = window_start(period, now);
    let mut rows: BTreeMap<String, LeaderboardEntry> = BTreeMap::new();

    for (learner_id, record) in progress.iter() {
        let Some(last_played) = record.last_played_at else {
            continue;
        };
        if let Some(start) = start {
            if last_played < start {
                continue;
            }
        }
        let entry = rows.entry(learner_id.clone()).or_insert_with(|| {
            let learner = learners.get_or_default(learner_id);
            let display_name = if learner.display_name.is_empty() {
                learner.id.clone()
            } else {
                learner.display_name
            };
            LeaderboardEntry {
                learner_id: learner_id.clone(),
                display_name,
                total_score: 0,
                games_played: 0,
                total_time_played_secs: 0,
                last_played_at: last_played,
            }
        });
        entry.total_score += record.highest_score;
        entry.games_played += 1;
        entry.total_time_played_secs += record.total_time_played_secs;
        entry.last_played_at = entry.last_played_at.max(last_played);
    }

    let mut entries: Vec<LeaderboardEntry> = rows.into_values().collect();
    entries.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    entries.truncate(LEADERBOARD_SIZE);
    entries
}

/// Current top 10 for the period.
pub async fn top_entries(state: &AppState, period: LeaderboardPeriod) -> Vec<LeaderboardEntry> {
    let progress = state.progress.read().await;
    let learners = state.learners.read().await;
    aggregate(&progress, &learners, period, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludus_common::GameProgress;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn record(game: &str, score: u64, played: DateTime<Utc>) -> GameProgress {
        let mut p = GameProgress::new(game);
        p.record_play(1, 1, score, score, 30, played);
        p
    }

    #[test]
    fn test_window_starts() {
        // 2026-08-06 is a Thursday.
        let now = at(2026, 8, 6);
        assert_eq!(
            window_start(LeaderboardPeriod::Daily, now),
            Some(at(2026, 8, 6))
        );
        assert_eq!(
            window_start(LeaderboardPeriod::Weekly, now),
            Some(at(2026, 8, 3))
        );
        assert_eq!(
            window_start(LeaderboardPeriod::Monthly, now),
            Some(at(2026, 8, 1))
        );
        assert_eq!(window_start(LeaderboardPeriod::AllTime, now), None);
    }

    #[test]
    fn test_weekly_window_filters_and_ranks() {
        let now = at(2026, 8, 6);
        let mut progress = ProgressStore::default();
        // Two games this week for l1, one for l2, stale play for l3.
        progress.upsert("l1", record("finance-kids-1", 5, at(2026, 8, 4)));
        progress.upsert("l1", record("brain-teens-2", 7, at(2026, 8, 5)));
        progress.upsert("l2", record("finance-kids-1", 20, at(2026, 8, 3)));
        progress.upsert("l3", record("finance-kids-1", 50, at(2026, 7, 20)));

        let entries = aggregate(&progress, &LearnerStore::default(), LeaderboardPeriod::Weekly, now);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].learner_id, "l2");
        assert_eq!(entries[0].total_score, 20);
        assert_eq!(entries[1].learner_id, "l1");
        assert_eq!(entries[1].total_score, 12);
        assert_eq!(entries[1].games_played, 2);
    }

    #[test]
    fn test_top_list_is_capped_at_ten() {
        let now = at(2026, 8, 6);
        let mut progress = ProgressStore::default();
        for i in 0..15 {
            progress.upsert(
                &format!("learner-{i:02}"),
                record("finance-kids-1", i as u64, at(2026, 8, 6)),
            );
        }
        let entries = aggregate(&progress, &LearnerStore::default(), LeaderboardPeriod::Daily, now);
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].total_score, 14);
    }
}
