//! Where configuration documents come from.
//!
//! Every document is addressed by a resource key: `game_settings`, `waves`,
//! `maps` (the map index) and one data key per map. Documents are JSON.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logic::{GameConfiguration, GameMap, GameSettings, WaveInfo};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::LoaderError;
use crate::map_repository::MapInfo;

pub const GAME_SETTINGS_KEY: &str = "game_settings";
pub const WAVES_KEY: &str = "waves";

/// A read-only store of configuration documents.
pub trait ConfigurationSource: Send + Sync {
    /// Raw contents of the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] (kind `NotFound` for unknown keys).
    fn read(&self, key: &str) -> io::Result<String>;
}

/// Documents stored as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ConfigurationSource for DirectorySource {
    fn read(&self, key: &str) -> io::Result<String> {
        let path = self.root.join(format!("{key}.json"));
        debug!(path = %path.display(), "reading configuration");
        fs::read_to_string(path)
    }
}

/// Documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemorySource::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, document: impl Into<String>) -> Self {
        self.insert(key, document);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, document: impl Into<String>) {
        self.documents.insert(key.into(), document.into());
    }
}

impl ConfigurationSource for MemorySource {
    fn read(&self, key: &str) -> io::Result<String> {
        self.documents.get(key).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no document {key:?}"))
        })
    }
}

/// Read and decode the document stored under `key`.
///
/// # Errors
///
/// Returns [`LoaderError::Source`] if it cannot be read and
/// [`LoaderError::Document`] if it does not decode as `T`.
pub fn document<T: DeserializeOwned>(
    source: &dyn ConfigurationSource,
    key: &str,
) -> Result<T, LoaderError> {
    let raw = source.read(key).map_err(|source| LoaderError::Source {
        key: key.to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoaderError::Document {
        key: key.to_string(),
        source,
    })
}

/// Assemble settings, the map described by `map_info` and the wave schedule.
///
/// # Errors
///
/// Fails if any of the three documents is missing or invalid.
pub fn build_configuration(
    source: &dyn ConfigurationSource,
    map_info: &MapInfo,
) -> Result<GameConfiguration, LoaderError> {
    let settings: GameSettings = document(source, GAME_SETTINGS_KEY)?;
    let mut map: GameMap = document(source, &map_info.data_key)?;
    map.id.clone_from(&map_info.map_id);
    let waves: Vec<WaveInfo> = document(source, WAVES_KEY)?;
    Ok(GameConfiguration::new(settings, map, waves))
}
