//! Shared daemon state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::warn;

use ludus_common::{EventNotifier, GameCatalog};

use crate::config::LudusConfig;
use crate::store::{
    save_learners, save_profiles, save_progress, save_wallets, LearnerStore, ProfileStore,
    ProgressStore, Stores, WalletStore,
};

/// Application state shared across handlers.
pub struct AppState {
    pub config: LudusConfig,
    pub catalog: GameCatalog,
    pub progress: RwLock<ProgressStore>,
    pub wallets: RwLock<WalletStore>,
    pub profiles: RwLock<ProfileStore>,
    pub learners: RwLock<LearnerStore>,
    pub notifier: Arc<dyn EventNotifier>,
    pub start_time: Instant,
    /// One mutex per (learner, game) pair; completion and replay-unlock
    /// serialize on it so duplicate submissions cannot interleave.
    pair_locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl AppState {
    pub fn new(
        config: LudusConfig,
        catalog: GameCatalog,
        stores: Stores,
        notifier: Arc<dyn EventNotifier>,
    ) -> Self {
        Self {
            config,
            catalog,
            progress: RwLock::new(stores.progress),
            wallets: RwLock::new(stores.wallets),
            profiles: RwLock::new(stores.profiles),
            learners: RwLock::new(stores.learners),
            notifier,
            start_time: Instant::now(),
            pair_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the serialization lock for one (learner, game) pair.
    /// Different pairs proceed in parallel.
    pub async fn lock_pair(&self, learner_id: &str, game_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.pair_locks.lock().await;
            locks
                .entry((learner_id.to_string(), game_id.to_string()))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Snapshot all stores to disk. Best-effort: memory stays authoritative
    /// and failures are logged, not propagated.
    pub async fn persist(&self) {
        let data_dir = &self.config.data_dir;
        if let Err(e) = save_progress(data_dir, &*self.progress.read().await) {
            warn!("Failed to snapshot progress store: {e}");
        }
        if let Err(e) = save_wallets(data_dir, &*self.wallets.read().await) {
            warn!("Failed to snapshot wallet store: {e}");
        }
        if let Err(e) = save_profiles(data_dir, &*self.profiles.read().await) {
            warn!("Failed to snapshot profile store: {e}");
        }
        if let Err(e) = save_learners(data_dir, &*self.learners.read().await) {
            warn!("Failed to snapshot learner store: {e}");
        }
    }

    /// Distinct games the learner has progress in within one pillar, and
    /// whether the given game is already among them.
    pub async fn pillar_usage(&self, learner_id: &str, pillar: &str, game_id: &str) -> (u32, bool) {
        let progress = self.progress.read().await;
        let Some(games) = progress.for_learner(learner_id) else {
            return (0, false);
        };
        let mut started = 0u32;
        let mut includes_game = false;
        for id in games.keys() {
            let Some(game) = self.catalog.get(id) else {
                continue;
            };
            if game.pillar == pillar {
                started += 1;
                if id == game_id {
                    includes_game = true;
                }
            }
        }
        (started, includes_game)
    }
}
