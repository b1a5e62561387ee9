//! Per-entity observer lists.
//!
//! A [`ListenerRegistry`] holds the handles of entities that want to hear
//! about the owning entity's removal. It is a relation, never ownership: the
//! observed entity does not keep its observers alive.

use crate::id::EntityId;

/// Ordered set of listener handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerRegistry {
    listeners: Vec<EntityId>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. Returns `false` if it was already registered.
    pub fn add(&mut self, listener: EntityId) -> bool {
        if self.listeners.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Deregister `listener`. Returns `false` if it was not registered.
    pub fn remove(&mut self, listener: EntityId) -> bool {
        match self.listeners.iter().position(|&l| l == listener) {
            Some(pos) => {
                self.listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `listener` is registered.
    #[must_use]
    pub fn contains(&self, listener: EntityId) -> bool {
        self.listeners.contains(&listener)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listener handles in registration order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.listeners.iter().copied()
    }
}

impl IntoIterator for ListenerRegistry {
    type Item = EntityId;
    type IntoIter = std::vec::IntoIter<EntityId>;

    fn into_iter(self) -> Self::IntoIter {
        self.listeners.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut registry = ListenerRegistry::new();
        assert!(registry.add(EntityId(1)));
        assert!(!registry.add(EntityId(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_unknown_listener() {
        let mut registry = ListenerRegistry::new();
        registry.add(EntityId(1));
        assert!(!registry.remove(EntityId(2)));
        assert!(registry.remove(EntityId(1)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_iteration_keeps_registration_order() {
        let mut registry = ListenerRegistry::new();
        registry.add(EntityId(3));
        registry.add(EntityId(1));
        registry.add(EntityId(2));
        let order: Vec<_> = registry.iter().collect();
        assert_eq!(order, vec![EntityId(3), EntityId(1), EntityId(2)]);
    }
}
