//! The immutable configuration bundle a game is played with.

use serde::{Deserialize, Serialize};

use crate::map::GameMap;

/// Global balance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSettings {
    /// Credits the player starts with.
    pub credits: i64,
    /// Lives the player starts with.
    pub lives: i64,
    /// Share of a tower's value refunded when it is sold.
    pub tower_sell_ratio: f32,
    /// Seconds between two waves.
    pub wave_interval: f32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            credits: 500,
            lives: 20,
            tower_sell_ratio: 0.5,
            wave_interval: 20.0,
        }
    }
}

/// One enemy spawned as part of a wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveEntry {
    /// Entity type name to construct (e.g. `"soldier"`).
    pub name: String,
    /// Seconds after the previous entry.
    #[serde(default)]
    pub delay: f32,
    /// Index of the map path to walk.
    #[serde(default)]
    pub path_index: usize,
}

/// A scheduled group of enemies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveInfo {
    pub enemies: Vec<WaveEntry>,
    /// Credits awarded for clearing the wave.
    pub reward: i64,
}

/// Everything a game is played with: settings, map and wave schedule.
///
/// Built once per map load and shared with the engine as an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfiguration {
    settings: GameSettings,
    map: GameMap,
    waves: Vec<WaveInfo>,
}

impl GameConfiguration {
    #[must_use]
    pub fn new(settings: GameSettings, map: GameMap, waves: Vec<WaveInfo>) -> Self {
        Self {
            settings,
            map,
            waves,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn map(&self) -> &GameMap {
        &self.map
    }

    #[must_use]
    pub fn waves(&self) -> &[WaveInfo] {
        &self.waves
    }
}
