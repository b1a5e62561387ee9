//! Entity handles.
//!
//! Observers and trackers keep an [`EntityId`] instead of a reference to the
//! entity. Looking up a handle whose entity has been removed yields nothing,
//! so a stale handle can never reach freed state.

use serde::{Deserialize, Serialize};

/// Handle to an entity in the [`World`](crate::World).
///
/// Ordered by allocation, which is also the order entities are ticked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out handles for one world. A handle is never issued twice, even
/// after its entity is gone.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    issued: u64,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> EntityId {
        self.issued += 1;
        EntityId(self.issued)
    }

    /// Handles issued so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_never_reused() {
        let mut allocator = EntityAllocator::new();
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert_ne!(first, second);
        assert!(first < second);
        assert_eq!(allocator.issued(), 2);
    }

    #[test]
    fn test_display_and_serde() {
        let id = EntityId(12);
        assert_eq!(id.to_string(), "#12");
        assert_eq!(serde_json::to_string(&id).unwrap(), "12");
        assert_eq!(id.raw(), 12);
    }
}
