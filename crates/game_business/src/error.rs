use std::io;

use engine_entity::EntityError;
use engine_logic::StateError;

/// Failures while building configurations or saving and loading games.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// A configuration document could not be read.
    #[error("could not read configuration {key:?}")]
    Source {
        key: String,
        #[source]
        source: io::Error,
    },

    /// A configuration document is not valid.
    #[error("configuration {key:?} is invalid")]
    Document {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The map index is empty or names a missing default.
    #[error("invalid map index: {0}")]
    MapIndex(String),

    /// No map with this id exists.
    #[error("unknown map {0:?}")]
    UnknownMap(String),

    /// There is no game to save.
    #[error("no map loaded")]
    NoMapLoaded,

    /// A map entity could not be created.
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Writing the save artifact failed.
    #[error("could not save game")]
    Save(#[source] StateError),

    /// The save artifact exists but cannot be opened.
    #[error("could not open saved game")]
    Open(#[source] io::Error),

    /// The save artifact exists but is not a valid game state.
    #[error("saved game is corrupt")]
    Corrupt(#[source] StateError),

    /// The saved game could not be applied to the engine.
    #[error("could not restore saved game")]
    Restore(#[source] StateError),
}
