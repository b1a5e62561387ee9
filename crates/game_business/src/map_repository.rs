//! The catalogue of playable maps.

use serde::{Deserialize, Serialize};

use crate::error::LoaderError;
use crate::source::{ConfigurationSource, document};

/// Resource key of the map index document.
pub const MAPS_KEY: &str = "maps";

/// Identifies a map and the document holding its layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    pub map_id: String,
    pub data_key: String,
}

impl MapInfo {
    pub fn new(map_id: impl Into<String>, data_key: impl Into<String>) -> Self {
        Self {
            map_id: map_id.into(),
            data_key: data_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapIndex {
    default: String,
    maps: Vec<MapInfo>,
}

/// Known maps, one of which is the default.
#[derive(Debug, Clone)]
pub struct MapRepository {
    maps: Vec<MapInfo>,
    default: usize,
}

impl MapRepository {
    /// # Errors
    ///
    /// Returns [`LoaderError::MapIndex`] if `maps` has no entry for
    /// `default_id`.
    pub fn new(maps: Vec<MapInfo>, default_id: &str) -> Result<Self, LoaderError> {
        let default = maps
            .iter()
            .position(|map| map.map_id == default_id)
            .ok_or_else(|| LoaderError::MapIndex(format!("default map {default_id:?} not listed")))?;
        Ok(Self { maps, default })
    }

    /// Load the index stored under [`MAPS_KEY`]:
    /// `{ "default": id, "maps": [{ "mapId", "dataKey" }] }`.
    ///
    /// # Errors
    ///
    /// Fails if the document is missing, invalid, or names an unknown default.
    pub fn from_source(source: &dyn ConfigurationSource) -> Result<Self, LoaderError> {
        let index: MapIndex = document(source, MAPS_KEY)?;
        Self::new(index.maps, &index.default)
    }

    #[must_use]
    pub fn default_map(&self) -> &MapInfo {
        &self.maps[self.default]
    }

    #[must_use]
    pub fn get_by_id(&self, map_id: &str) -> Option<&MapInfo> {
        self.maps.iter().find(|map| map.map_id == map_id)
    }

    #[must_use]
    pub fn maps(&self) -> &[MapInfo] {
        &self.maps
    }
}
