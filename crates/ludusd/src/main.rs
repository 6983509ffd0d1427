//! Ludus Daemon - Game progression and rewards ledger
//!
//! Gates game access, grants coins and experience, and keeps wallet,
//! progress, and profile records consistent under duplicate requests.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ludus_common::GameCatalog;
use ludusd::config::{LudusConfig, CONFIG_PATH};
use ludusd::notifier::EventBus;
use ludusd::server;
use ludusd::state::AppState;
use ludusd::store::Stores;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Ludus Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = LudusConfig::load(Path::new(CONFIG_PATH));

    let catalog = match GameCatalog::load(&config.catalog_path) {
        Ok(catalog) => {
            info!("Loaded {} games from catalog", catalog.len());
            catalog
        }
        Err(e) => {
            warn!(
                "No catalog at {}: {e}; starting with an empty catalog",
                config.catalog_path.display()
            );
            GameCatalog::default()
        }
    };

    let stores = Stores::load(&config.data_dir);
    info!("Tracking {} learners", stores.progress.learner_count());

    let state = AppState::new(config, catalog, stores, Arc::new(EventBus::default()));

    info!("Ludus Daemon ready");
    server::run(state).await
}
