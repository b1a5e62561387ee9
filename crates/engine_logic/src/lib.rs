//! Single-writer simulation engine.
//!
//! The [`GameEngine`] owns the entity world and advances it one tick at a
//! time; other threads reach it through an [`EngineHandle`] that queues
//! commands. [`GameLoop`] runs an engine on its own thread at a fixed rate.

pub mod config;
pub mod engine;
pub mod error;
pub mod game_loop;
pub mod handle;
pub mod map;
pub mod message;
pub mod persister;
pub mod state;

pub use config::{GameConfiguration, GameSettings, WaveEntry, WaveInfo};
pub use engine::GameEngine;
pub use error::{EngineError, ErrorListener, StateError};
pub use game_loop::{GameLoop, LoopConfig};
pub use handle::EngineHandle;
pub use map::{GameMap, MapPath, PlateauInfo};
pub use message::{Command, Message};
pub use persister::{GamePersister, PendingState, Persister, Restore};
pub use state::GameState;
