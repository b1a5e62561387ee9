//! Entity-layer error types.

use crate::id::EntityId;

/// Errors raised by entity hooks and entity construction.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// No constructor is registered under the requested type name.
    #[error("unknown entity type: {0}")]
    UnknownType(String),

    /// Persisted entity state could not be decoded.
    #[error("invalid state for {name}: {source}")]
    State {
        /// Type name of the entity whose state was rejected.
        name: &'static str,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// An entity hook failed.
    #[error("{0}")]
    Failed(String),
}

impl EntityError {
    /// Convenience constructor for [`EntityError::Failed`].
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A failure that aborted the entity phase of a tick.
#[derive(Debug, thiserror::Error)]
#[error("{name} {id} failed to tick")]
pub struct TickError {
    /// Handle of the entity whose tick failed.
    pub id: EntityId,
    /// Type name of that entity.
    pub name: &'static str,
    /// What went wrong.
    #[source]
    pub source: EntityError,
}
