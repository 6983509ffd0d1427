//! Configuration management for ludusd.
//!
//! Loads settings from /etc/ludus/config.toml or uses defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/ludus/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LudusConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory holding the JSON store snapshots.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Authored game catalog (JSON list of entries).
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Distinct games a free-plan learner may start per pillar.
    #[serde(default = "default_free_games_per_pillar")]
    pub free_games_per_pillar: u32,

    /// How many recent transactions the wallet endpoint returns.
    #[serde(default = "default_transactions_returned")]
    pub transactions_returned: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7440".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/ludus")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("/var/lib/ludus/catalog.json")
}

fn default_free_games_per_pillar() -> u32 {
    5
}

fn default_transactions_returned() -> usize {
    50
}

impl Default for LudusConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_dir: default_data_dir(),
            catalog_path: default_catalog_path(),
            free_games_per_pillar: default_free_games_per_pillar(),
            transactions_returned: default_transactions_returned(),
        }
    }
}

impl LudusConfig {
    /// Load config from disk, falling back to defaults on any problem.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {e}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }
}
