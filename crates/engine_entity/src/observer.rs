//! Sinks for entity lifecycle events.
//!
//! Renderers, sound players and similar collaborators implement
//! [`EntityObserver`] to learn about entities entering and leaving the world.
//! Observers are pure sinks and cannot influence simulation ordering.

use crate::entity::Entity;
use crate::id::EntityId;

/// Receives add/remove notifications from the [`World`](crate::World).
pub trait EntityObserver: Send {
    /// Called after `entity` was added and initialised.
    fn entity_added(&mut self, id: EntityId, entity: &dyn Entity);

    /// Called after `entity` was cleaned, just before it is dropped.
    fn entity_removed(&mut self, id: EntityId, entity: &dyn Entity);
}
