//! Entity store owned by the simulation engine.
//!
//! The [`World`] holds every live entity together with its listener registry.
//! It is only ever reached through `&mut`, so whoever owns it is the single
//! writer for all entity state.
//!
//! ## Detaching
//!
//! To run a hook, the world moves the entity out of its slot and hands the
//! hook an [`EntityContext`] that borrows the whole world mutably. While the
//! entity is detached:
//!
//! - removing it only marks the slot; `clean` runs once the hook returns,
//! - removal notifications addressed to it are queued and delivered in order
//!   as soon as the hook returns,
//! - it cannot be ticked twice, because ticking also detaches.
//!
//! This is what lets entities add and remove other entities (or themselves)
//! in the middle of a frame without corrupting iteration.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use engine_math::Vec2;
use tracing::{debug, warn};

use crate::context::EntityContext;
use crate::entity::{Entity, EntityCategory};
use crate::error::TickError;
use crate::id::{EntityAllocator, EntityId};
use crate::listener::ListenerRegistry;
use crate::observer::EntityObserver;

/// Storage for one entity and its observers.
struct Slot {
    /// `None` while the entity is detached for a hook.
    entity: Option<Box<dyn Entity>>,
    listeners: ListenerRegistry,
    /// Removal notifications that arrived while detached.
    pending: VecDeque<EntityId>,
    /// Set as soon as removal is requested.
    removed: bool,
}

impl Slot {
    fn detached() -> Self {
        Self {
            entity: None,
            listeners: ListenerRegistry::new(),
            pending: VecDeque::new(),
            removed: false,
        }
    }
}

/// The engine-owned collection of live entities.
pub struct World {
    /// Handle allocator.
    allocator: EntityAllocator,
    /// Slots keyed by handle; handles increase, so this is insertion order.
    slots: BTreeMap<EntityId, Slot>,
    /// Render/sound sinks.
    observers: Vec<Box<dyn EntityObserver>>,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            slots: BTreeMap::new(),
            observers: Vec::new(),
        }
    }

    /// Attach an observer that is told about every add and remove.
    pub fn add_observer(&mut self, observer: Box<dyn EntityObserver>) {
        self.observers.push(observer);
    }

    // -- Lifecycle --

    /// Insert `entity` and run its `init` hook before returning.
    pub fn add(&mut self, mut entity: Box<dyn Entity>) -> EntityId {
        let id = self.allocator.allocate();
        debug!(%id, name = entity.name(), "adding entity");

        self.slots.insert(id, Slot::detached());
        entity.init(&mut EntityContext::new(self, id));
        for observer in &mut self.observers {
            observer.entity_added(id, entity.as_ref());
        }
        self.attach(id, entity);
        id
    }

    /// Remove the entity behind `id`, running its `clean` hook and notifying
    /// its listeners.
    ///
    /// If the entity is currently running a hook, the removal completes when
    /// that hook returns. Returns `false` if the handle is unknown or already
    /// being removed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        if slot.removed {
            return false;
        }
        slot.removed = true;
        if slot.entity.is_some() {
            self.finish_removal(id);
        }
        true
    }

    /// Remove every entity.
    pub fn clear(&mut self) {
        // `clean` hooks may add or remove entities, so re-scan until settled.
        while let Some(id) = self.next_live_id() {
            self.remove(id);
        }
    }

    /// Tick every entity that is live now, in handle order.
    ///
    /// Entities added during this call are not ticked until the next call;
    /// entities removed during this call are skipped.
    ///
    /// # Errors
    ///
    /// Stops at the first failing entity and returns its error; entities after
    /// it are not ticked.
    pub fn tick_all(&mut self) -> Result<(), TickError> {
        let ids: Vec<EntityId> = self.slots.keys().copied().collect();
        for id in ids {
            let Some(mut entity) = self.detach(id) else {
                continue;
            };
            let result = entity.tick(&mut EntityContext::new(self, id));
            let name = entity.name();
            self.attach(id, entity);
            result.map_err(|source| TickError { id, name, source })?;
        }
        Ok(())
    }

    /// Drop slots whose entity was lost while detached, e.g. by a panic
    /// unwinding through a hook. Listeners of those entities are notified.
    ///
    /// Returns the number of slots discarded.
    pub fn discard_detached(&mut self) -> usize {
        let orphans: Vec<EntityId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.entity.is_none())
            .map(|(&id, _)| id)
            .collect();
        for &id in &orphans {
            warn!(%id, "discarding entity lost during a failed tick");
            if let Some(slot) = self.slots.remove(&id) {
                for listener in slot.listeners {
                    self.notify_removed(listener, id);
                }
            }
        }
        orphans.len()
    }

    // -- Listeners --

    /// Register `listener` on `target`.
    ///
    /// Returns `false` if `target` is not live or `listener` was already
    /// registered.
    pub fn add_listener(&mut self, target: EntityId, listener: EntityId) -> bool {
        match self.slots.get_mut(&target) {
            Some(slot) if !slot.removed => slot.listeners.add(listener),
            _ => false,
        }
    }

    /// Deregister `listener` from `target`.
    pub fn remove_listener(&mut self, target: EntityId, listener: EntityId) -> bool {
        self.slots
            .get_mut(&target)
            .is_some_and(|slot| slot.listeners.remove(listener))
    }

    /// Returns `true` if `listener` is registered on `target`.
    #[must_use]
    pub fn has_listener(&self, target: EntityId, listener: EntityId) -> bool {
        self.slots
            .get(&target)
            .is_some_and(|slot| slot.listeners.contains(listener))
    }

    /// Number of listeners registered on `target`.
    #[must_use]
    pub fn listener_count(&self, target: EntityId) -> usize {
        self.slots.get(&target).map_or(0, |slot| slot.listeners.len())
    }

    /// Every entity `listener` is currently registered on.
    #[must_use]
    pub fn observed_by(&self, listener: EntityId) -> Vec<EntityId> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.listeners.contains(listener))
            .map(|(&id, _)| id)
            .collect()
    }

    // -- Queries --

    /// Returns `true` if `id` refers to an entity that has not been removed.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots.get(&id).is_some_and(|slot| !slot.removed)
    }

    /// Look up a live, attached entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        self.slots
            .get(&id)
            .filter(|slot| !slot.removed)
            .and_then(|slot| slot.entity.as_deref())
    }

    /// Look up a live, attached entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn Entity + 'static)> {
        self.slots
            .get_mut(&id)
            .filter(|slot| !slot.removed)
            .and_then(|slot| slot.entity.as_deref_mut())
    }

    /// Look up a live entity as its concrete type.
    #[must_use]
    pub fn get_as<T: Entity>(&self, id: EntityId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    /// Look up a live entity mutably as its concrete type.
    pub fn get_as_mut<T: Entity>(&mut self, id: EntityId) -> Option<&mut T> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Position of a live entity.
    #[must_use]
    pub fn position_of(&self, id: EntityId) -> Option<Vec2> {
        self.get(id).map(|entity| entity.position())
    }

    /// Iterate over live, attached entities in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> {
        self.slots.iter().filter_map(|(&id, slot)| {
            if slot.removed {
                return None;
            }
            slot.entity.as_deref().map(|entity| (id, entity))
        })
    }

    /// Iterate over live, attached entities of one category.
    pub fn by_category(
        &self,
        category: EntityCategory,
    ) -> impl Iterator<Item = (EntityId, &dyn Entity)> {
        self.iter()
            .filter(move |(_, entity)| entity.category() == category)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.values().filter(|slot| !slot.removed).count()
    }

    /// Returns `true` if no entity is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Internals --

    fn next_live_id(&self) -> Option<EntityId> {
        self.slots
            .iter()
            .find(|(_, slot)| !slot.removed)
            .map(|(&id, _)| id)
    }

    /// Move a live entity out of its slot so a hook can run on it.
    fn detach(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let slot = self.slots.get_mut(&id)?;
        if slot.removed {
            return None;
        }
        slot.entity.take()
    }

    /// Put a detached entity back, delivering queued notifications first and
    /// completing a removal requested while it was detached.
    fn attach(&mut self, id: EntityId, mut entity: Box<dyn Entity>) {
        loop {
            let Some(slot) = self.slots.get_mut(&id) else {
                return;
            };
            if slot.removed {
                break;
            }
            let Some(removed) = slot.pending.pop_front() else {
                break;
            };
            entity.entity_removed(removed, &mut EntityContext::new(self, id));
        }

        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        slot.pending.clear();
        slot.entity = Some(entity);
        if slot.removed {
            self.finish_removal(id);
        }
    }

    fn finish_removal(&mut self, id: EntityId) {
        let Some(slot) = self.slots.remove(&id) else {
            return;
        };
        let Slot {
            entity, listeners, ..
        } = slot;

        if let Some(mut entity) = entity {
            debug!(%id, name = entity.name(), "removing entity");
            entity.clean(&mut EntityContext::new(self, id));
            for observer in &mut self.observers {
                observer.entity_removed(id, entity.as_ref());
            }
        }

        for listener in listeners {
            self.notify_removed(listener, id);
        }
    }

    fn notify_removed(&mut self, listener: EntityId, removed: EntityId) {
        let Some(slot) = self.slots.get_mut(&listener) else {
            return;
        };
        if slot.removed {
            return;
        }
        match slot.entity.take() {
            Some(mut entity) => {
                entity.entity_removed(removed, &mut EntityContext::new(self, listener));
                self.attach(listener, entity);
            }
            None => slot.pending.push_back(removed),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.len())
            .field("allocated", &self.allocator.issued())
            .field("observers", &self.observers.len())
            .finish()
    }
}
