//! Game catalog: read-only reward parameters and metadata per mini-game.
//!
//! Pillar, age band, and ordinal are explicit fields resolved once at load
//! time. Parsing them out of the identifier text survives only as the
//! load-time fallback for legacy entries that omit the explicit fields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::LudusError;

/// Coins granted when a game declares neither totalCoins nor coinsPerLevel.
pub const DEFAULT_GAME_COINS: u64 = 5;

/// Age band a game is tagged with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AgeBand {
    Kids,
    Teens,
    YoungAdult,
    Adults,
}

impl AgeBand {
    /// Parse a single identifier segment ("kids", "teens", "adults").
    /// "young-adult" spans two segments and is handled by the id parser.
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "kids" => Some(AgeBand::Kids),
            "teens" => Some(AgeBand::Teens),
            "adults" => Some(AgeBand::Adults),
            _ => None,
        }
    }
}

/// Badge metadata attached to badge-eligible games.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BadgeMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A single catalog entry. Immutable from the daemon's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDefinition {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Top-level content category, used for per-plan game-count limits.
    #[serde(default)]
    pub pillar: String,
    /// Absent band means ungated legacy content (fail-open).
    #[serde(default)]
    pub age_band: Option<AgeBand>,
    /// Position within the pillar, drives replay pricing. 0 = unknown.
    #[serde(default)]
    pub ordinal: u32,
    #[serde(default)]
    pub total_levels: u32,
    #[serde(default)]
    pub coins_per_level: u64,
    #[serde(default)]
    pub total_coins: Option<u64>,
    #[serde(default)]
    pub total_xp: Option<u64>,
    #[serde(default)]
    pub badge: Option<BadgeMeta>,
}

impl GameDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            pillar: String::new(),
            age_band: None,
            ordinal: 0,
            total_levels: 0,
            coins_per_level: 0,
            total_coins: None,
            total_xp: None,
            badge: None,
        }
    }

    /// Badge-eligible games carry badge metadata.
    pub fn badge_eligible(&self) -> bool {
        self.badge.is_some()
    }

    /// Fill pillar, age band, and ordinal from the identifier text when the
    /// authored entry omitted them. Runs once, at catalog load.
    fn resolve_from_id(&mut self) {
        let parsed = parse_game_id(&self.id);
        if self.pillar.is_empty() {
            self.pillar = parsed.pillar;
        }
        if self.age_band.is_none() {
            self.age_band = parsed.age_band;
        }
        if self.ordinal == 0 {
            self.ordinal = parsed.ordinal;
        }
    }
}

/// Fields recoverable from an identifier like `finance-kids-41`.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedGameId {
    pub pillar: String,
    pub age_band: Option<AgeBand>,
    pub ordinal: u32,
}

/// Best-effort split of a game identifier into pillar, band, and ordinal.
///
/// Layout is `<pillar..>-<band>-<ordinal>` where pillar may itself contain
/// dashes and band or ordinal may be missing.
pub fn parse_game_id(id: &str) -> ParsedGameId {
    let mut segments: Vec<&str> = id.split('-').filter(|s| !s.is_empty()).collect();

    let ordinal = match segments.last().and_then(|s| s.parse::<u32>().ok()) {
        Some(n) => {
            segments.pop();
            n
        }
        None => 0,
    };

    let mut age_band = None;
    if let Some(last) = segments.last() {
        if let Some(band) = AgeBand::from_segment(last) {
            age_band = Some(band);
            segments.pop();
        } else if *last == "adult" && segments.len() >= 2 && segments[segments.len() - 2] == "young"
        {
            age_band = Some(AgeBand::YoungAdult);
            segments.pop();
            segments.pop();
        }
    }

    ParsedGameId {
        pillar: segments.join("-"),
        age_band,
        ordinal,
    }
}

/// In-memory catalog, keyed by game id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameCatalog {
    games: HashMap<String, GameDefinition>,
}

impl GameCatalog {
    /// Build a catalog from authored entries, resolving missing metadata.
    pub fn from_entries(entries: Vec<GameDefinition>) -> Self {
        let mut games = HashMap::new();
        for mut entry in entries {
            entry.resolve_from_id();
            games.insert(entry.id.clone(), entry);
        }
        Self { games }
    }

    /// Load the catalog from a JSON file (a list of entries).
    pub fn load(path: &Path) -> Result<Self, LudusError> {
        let content = fs::read_to_string(path)?;
        let entries: Vec<GameDefinition> = serde_json::from_str(&content)?;
        Ok(Self::from_entries(entries))
    }

    pub fn get(&self, id: &str) -> Option<&GameDefinition> {
        self.games.get(id)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_id() {
        let parsed = parse_game_id("finance-kids-41");
        assert_eq!(parsed.pillar, "finance");
        assert_eq!(parsed.age_band, Some(AgeBand::Kids));
        assert_eq!(parsed.ordinal, 41);
    }

    #[test]
    fn test_parse_multi_segment_pillar() {
        let parsed = parse_game_id("digital-citizenship-teens-12");
        assert_eq!(parsed.pillar, "digital-citizenship");
        assert_eq!(parsed.age_band, Some(AgeBand::Teens));
        assert_eq!(parsed.ordinal, 12);
    }

    #[test]
    fn test_parse_young_adult_band() {
        let parsed = parse_game_id("brain-young-adult-3");
        assert_eq!(parsed.pillar, "brain");
        assert_eq!(parsed.age_band, Some(AgeBand::YoungAdult));
        assert_eq!(parsed.ordinal, 3);
    }

    #[test]
    fn test_parse_without_band_or_ordinal() {
        let parsed = parse_game_id("budgeting");
        assert_eq!(parsed.pillar, "budgeting");
        assert_eq!(parsed.age_band, None);
        assert_eq!(parsed.ordinal, 0);
    }

    #[test]
    fn test_explicit_fields_win_over_id_text() {
        let mut entry = GameDefinition::new("finance-kids-41");
        entry.pillar = "money".to_string();
        entry.ordinal = 7;
        let catalog = GameCatalog::from_entries(vec![entry]);
        let game = catalog.get("finance-kids-41").unwrap();
        assert_eq!(game.pillar, "money");
        assert_eq!(game.ordinal, 7);
        // Band was omitted, so it still comes from the id.
        assert_eq!(game.age_band, Some(AgeBand::Kids));
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let entries = vec![GameDefinition::new("finance-kids-1")];
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();
        let catalog = GameCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("finance-kids-1").unwrap().ordinal, 1);
    }
}
