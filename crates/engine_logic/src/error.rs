//! Engine error types and the error listener interface.

use engine_entity::{EntityError, TickError};

/// A failure that aborted a tick or prevented a command from being queued.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An entity failed during the entity phase.
    #[error(transparent)]
    Entity(#[from] TickError),

    /// A queued command failed.
    #[error("command {name} failed")]
    Command {
        /// Name the command was posted under.
        name: &'static str,
        /// What went wrong.
        #[source]
        source: anyhow::Error,
    },

    /// A command or an entity hook panicked.
    #[error("tick panicked: {0}")]
    Panicked(String),

    /// The engine that owned the queue has been dropped.
    #[error("engine is no longer running")]
    Disconnected,

    /// A blocking call was made from the engine's own thread.
    #[error("{0} would block the engine thread")]
    WrongThread(&'static str),

    /// The loop thread could not be started.
    #[error("failed to spawn the game loop thread")]
    Spawn(#[source] std::io::Error),

    /// The loop configuration cannot be run.
    #[error("invalid loop configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Wrap any error as a failed command.
    pub fn command(name: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Command {
            name,
            source: source.into(),
        }
    }
}

impl From<EntityError> for EngineError {
    fn from(error: EntityError) -> Self {
        Self::command("entity", error)
    }
}

/// Errors raised while reading or writing a [`GameState`](crate::GameState).
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A required key is absent.
    #[error("missing state field {0:?}")]
    Missing(String),

    /// A key is present but holds a value of another type.
    #[error("state field {key:?} is not {expected}")]
    WrongType {
        /// The offending key.
        key: String,
        /// The type that was asked for.
        expected: &'static str,
    },

    /// The state could not be encoded or decoded.
    #[error("state serialization failed")]
    Json(#[from] serde_json::Error),

    /// The state could not be written to or read from its artifact.
    #[error("state I/O failed")]
    Io(#[from] std::io::Error),

    /// An entity could not be restored.
    #[error(transparent)]
    Entity(#[from] EntityError),
}

/// Receives every failure that aborted a tick.
pub trait ErrorListener: Send + Sync {
    /// Called once per failed tick with the number of ticks completed since
    /// the engine started or was last cleared.
    fn error(&self, error: &EngineError, loop_count: u64);
}
