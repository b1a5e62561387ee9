//! Game configuration and save/load orchestration.
//!
//! [`GameLoader`] turns configuration documents from a
//! [`ConfigurationSource`] into running games, writes them to a
//! [`SaveStore`] and restores them, and deletes the save when the engine
//! fails right after a load.

pub mod error;
pub mod loader;
pub mod map_repository;
pub mod save;
pub mod source;

pub use error::LoaderError;
pub use loader::{
    APP_VERSION_KEY, CRASH_LOOP_THRESHOLD, GameLoader, LoaderListener, MAP_ID_KEY,
};
pub use map_repository::{MAPS_KEY, MapInfo, MapRepository};
pub use save::{SAVED_GAME_FILE, SaveStore};
pub use source::{
    ConfigurationSource, DirectorySource, GAME_SETTINGS_KEY, MemorySource, WAVES_KEY,
    build_configuration, document,
};
