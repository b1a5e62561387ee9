//! Context handed to entity hooks.

use std::ops::{Deref, DerefMut};

use crate::id::EntityId;
use crate::world::World;

/// Access to the world from inside an entity hook.
///
/// While a hook runs, the entity itself is detached from the world: looking
/// up [`EntityContext::id`] through the world yields nothing, and removal
/// notifications addressed to it are held back until the hook returns.
/// Everything else in the world is reachable through `Deref`.
pub struct EntityContext<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl<'w> EntityContext<'w> {
    pub(crate) fn new(world: &'w mut World, id: EntityId) -> Self {
        Self { world, id }
    }

    /// Handle of the entity whose hook is running.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Remove the entity whose hook is running.
    ///
    /// The removal completes (and `clean` runs) once the hook returns.
    pub fn remove_self(&mut self) -> bool {
        self.world.remove(self.id)
    }

    /// Register the running entity as a listener on `target`.
    pub fn listen_to(&mut self, target: EntityId) -> bool {
        self.world.add_listener(target, self.id)
    }

    /// Deregister the running entity from `target`.
    pub fn stop_listening_to(&mut self, target: EntityId) -> bool {
        self.world.remove_listener(target, self.id)
    }
}

impl Deref for EntityContext<'_> {
    type Target = World;

    fn deref(&self) -> &World {
        self.world
    }
}

impl DerefMut for EntityContext<'_> {
    fn deref_mut(&mut self) -> &mut World {
        self.world
    }
}
