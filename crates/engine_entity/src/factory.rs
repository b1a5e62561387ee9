//! Entity factory registry mapping type names to constructors.
//!
//! Maps, saved games and wave schedules refer to entities by type name. The
//! registry turns such a name into a fresh instance without the engine ever
//! matching on concrete types.

use std::collections::HashMap;
use std::fmt;

use crate::entity::Entity;
use crate::error::EntityError;

/// A constructor producing a fresh, not yet initialised entity.
pub type EntityConstructor = Box<dyn Fn() -> Box<dyn Entity> + Send + Sync>;

/// Registry of entity constructors keyed by type name.
#[derive(Default)]
pub struct EntityRegistry {
    factories: HashMap<String, EntityConstructor>,
}

impl EntityRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a constructor under `name`.
    ///
    /// Returns `false` if an existing constructor was replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> bool
    where
        F: Fn() -> Box<dyn Entity> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.into(), Box::new(constructor))
            .is_none()
    }

    /// Construct a new entity of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnknownType`] if nothing is registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Entity>, EntityError> {
        self.factories
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| EntityError::UnknownType(name.to_string()))
    }

    /// Returns `true` if a constructor is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns an iterator over all registered type names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("EntityRegistry")
            .field("types", &names)
            .finish()
    }
}
