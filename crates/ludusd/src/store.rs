//! In-memory stores with JSON snapshots under the data directory.
//!
//! Memory is authoritative; snapshots are best-effort and reloaded at
//! startup, the same pattern the platform uses for every small document
//! store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use ludus_common::{AggregateProfile, GameProgress, Learner, LudusError, Wallet};

fn load_json<T: Default + DeserializeOwned>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    match fs::read_to_string(path).map_err(LudusError::from).and_then(|content| {
        serde_json::from_str::<T>(&content).map_err(LudusError::from)
    }) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to load {}: {e}, starting empty", path.display());
            T::default()
        }
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), LudusError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

/// Per-learner, per-game progress records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressStore {
    records: HashMap<String, HashMap<String, GameProgress>>,
}

impl ProgressStore {
    pub fn get(&self, learner_id: &str, game_id: &str) -> Option<&GameProgress> {
        self.records.get(learner_id)?.get(game_id)
    }

    pub fn upsert(&mut self, learner_id: &str, progress: GameProgress) {
        self.records
            .entry(learner_id.to_string())
            .or_default()
            .insert(progress.game_id.clone(), progress);
    }

    pub fn for_learner(&self, learner_id: &str) -> Option<&HashMap<String, GameProgress>> {
        self.records.get(learner_id)
    }

    /// Every record in the store, for leaderboard aggregation.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GameProgress)> {
        self.records
            .iter()
            .flat_map(|(learner, games)| games.values().map(move |p| (learner, p)))
    }

    pub fn learner_count(&self) -> usize {
        self.records.len()
    }
}

/// Wallets keyed by learner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletStore {
    wallets: HashMap<String, Wallet>,
}

impl WalletStore {
    pub fn get(&self, learner_id: &str) -> Option<&Wallet> {
        self.wallets.get(learner_id)
    }

    pub fn get_or_create(&mut self, learner_id: &str) -> &mut Wallet {
        self.wallets
            .entry(learner_id.to_string())
            .or_insert_with(|| Wallet::new(learner_id))
    }

    pub fn balance_of(&self, learner_id: &str) -> u64 {
        self.wallets.get(learner_id).map_or(0, |w| w.balance)
    }
}

/// Aggregate profiles keyed by learner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileStore {
    profiles: HashMap<String, AggregateProfile>,
}

impl ProfileStore {
    pub fn get(&self, learner_id: &str) -> Option<&AggregateProfile> {
        self.profiles.get(learner_id)
    }

    pub fn get_or_create(&mut self, learner_id: &str) -> &mut AggregateProfile {
        self.profiles
            .entry(learner_id.to_string())
            .or_insert_with(|| AggregateProfile::new(learner_id))
    }
}

/// Learner registry. Unknown learners resolve to defaults (free plan, no
/// birth date) rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnerStore {
    learners: HashMap<String, Learner>,
}

impl LearnerStore {
    pub fn get_or_default(&self, learner_id: &str) -> Learner {
        self.learners
            .get(learner_id)
            .cloned()
            .unwrap_or_else(|| Learner::new(learner_id))
    }

    pub fn upsert(&mut self, learner: Learner) {
        self.learners.insert(learner.id.clone(), learner);
    }
}

/// All four stores plus their snapshot paths.
#[derive(Debug, Default)]
pub struct Stores {
    pub progress: ProgressStore,
    pub wallets: WalletStore,
    pub profiles: ProfileStore,
    pub learners: LearnerStore,
}

impl Stores {
    pub fn load(data_dir: &Path) -> Self {
        Self {
            progress: load_json(&Self::progress_path(data_dir)),
            wallets: load_json(&Self::wallets_path(data_dir)),
            profiles: load_json(&Self::profiles_path(data_dir)),
            learners: load_json(&Self::learners_path(data_dir)),
        }
    }

    fn progress_path(data_dir: &Path) -> PathBuf {
        data_dir.join("progress.json")
    }

    fn wallets_path(data_dir: &Path) -> PathBuf {
        data_dir.join("wallets.json")
    }

    fn profiles_path(data_dir: &Path) -> PathBuf {
        data_dir.join("profiles.json")
    }

    fn learners_path(data_dir: &Path) -> PathBuf {
        data_dir.join("learners.json")
    }
}

pub fn save_progress(data_dir: &Path, store: &ProgressStore) -> Result<(), LudusError> {
    save_json(&Stores::progress_path(data_dir), store)
}

pub fn save_wallets(data_dir: &Path, store: &WalletStore) -> Result<(), LudusError> {
    save_json(&Stores::wallets_path(data_dir), store)
}

pub fn save_profiles(data_dir: &Path, store: &ProfileStore) -> Result<(), LudusError> {
    save_json(&Stores::profiles_path(data_dir), store)
}

pub fn save_learners(data_dir: &Path, store: &LearnerStore) -> Result<(), LudusError> {
    save_json(&Stores::learners_path(data_dir), store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stores_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut stores = Stores::default();

        stores
            .progress
            .upsert("l1", GameProgress::new("finance-kids-1"));
        stores.wallets.get_or_create("l1").credit(
            7,
            "seed",
            chrono::Utc::now(),
        );
        stores.profiles.get_or_create("l1").grant_xp(10);
        stores.learners.upsert(Learner::new("l1"));

        save_progress(dir.path(), &stores.progress).unwrap();
        save_wallets(dir.path(), &stores.wallets).unwrap();
        save_profiles(dir.path(), &stores.profiles).unwrap();
        save_learners(dir.path(), &stores.learners).unwrap();

        let reloaded = Stores::load(dir.path());
        assert!(reloaded.progress.get("l1", "finance-kids-1").is_some());
        assert_eq!(reloaded.wallets.balance_of("l1"), 7);
        assert_eq!(reloaded.profiles.get("l1").unwrap().xp, 10);
        assert_eq!(reloaded.learners.get_or_default("l1").id, "l1");
    }

    #[test]
    fn test_missing_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let stores = Stores::load(dir.path());
        assert_eq!(stores.progress.learner_count(), 0);
        assert_eq!(stores.wallets.balance_of("nobody"), 0);
    }
}
