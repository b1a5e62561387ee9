//! Map documents.

use engine_math::Vec2;
use serde::{Deserialize, Serialize};

/// A buildable plot placed on the map at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateauInfo {
    /// Entity type name to construct (e.g. `"plateau"`).
    pub name: String,
    /// Where to place it.
    pub position: Vec2,
}

/// A path enemies walk along, as a list of waypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapPath {
    pub waypoints: Vec<Vec2>,
}

/// Layout of one playable map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    /// Map identifier. Filled in from the map index when the document omits it.
    #[serde(default)]
    pub id: String,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub plateaus: Vec<PlateauInfo>,
    #[serde(default)]
    pub paths: Vec<MapPath>,
}

impl GameMap {
    /// Path by index, as referenced from wave entries.
    #[must_use]
    pub fn path(&self, index: usize) -> Option<&MapPath> {
        self.paths.get(index)
    }
}
