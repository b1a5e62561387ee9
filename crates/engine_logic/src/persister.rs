//! Hooks that copy runtime state into and out of a [`GameState`].
//!
//! Restoring happens in two steps. Every persister first decodes its share
//! of the state into a [`Restore`] without touching the world; only once all
//! of them succeeded is the resulting [`PendingState`] applied. A save that
//! fails to decode therefore never leaves a half-restored game behind.

use engine_entity::{EntityRegistry, World};

use crate::error::StateError;
use crate::state::GameState;

/// A decoded share of a saved game, waiting to be applied to the world.
pub type Restore = Box<dyn FnOnce(&mut World) + Send>;

/// A participant in saving and restoring a game.
pub trait Persister: Send {
    /// Forget anything carried over from a previous game.
    fn reset_state(&mut self) {}

    /// Record this persister's share of the game into `state`.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if the records cannot be encoded.
    fn write_state(&self, world: &World, state: &mut GameState) -> Result<(), StateError>;

    /// Decode this persister's share of `state`, building any entities
    /// through `registry`, without modifying the world.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if the records are missing or malformed.
    fn decode_state(
        &self,
        registry: &EntityRegistry,
        state: &GameState,
    ) -> Result<Restore, StateError>;
}

/// Everything decoded from a [`GameState`], ready to be applied in
/// registration order.
#[must_use]
pub struct PendingState {
    steps: Vec<Restore>,
}

impl PendingState {
    pub fn apply(self, world: &mut World) {
        for step in self.steps {
            step(world);
        }
    }
}

impl std::fmt::Debug for PendingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingState")
            .field("steps", &self.steps.len())
            .finish()
    }
}

/// Ordered collection of [`Persister`]s, run as one.
#[derive(Default)]
pub struct GamePersister {
    persisters: Vec<Box<dyn Persister>>,
}

impl GamePersister {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, persister: Box<dyn Persister>) {
        self.persisters.push(persister);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.persisters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persisters.is_empty()
    }

    pub fn reset_state(&mut self) {
        for persister in &mut self.persisters {
            persister.reset_state();
        }
    }

    /// # Errors
    ///
    /// Stops at the first persister that fails.
    pub fn write_state(&self, world: &World, state: &mut GameState) -> Result<(), StateError> {
        for persister in &self.persisters {
            persister.write_state(world, state)?;
        }
        Ok(())
    }

    /// Decode every persister's share of `state`.
    ///
    /// # Errors
    ///
    /// Stops at the first persister that fails; nothing has been applied.
    pub fn decode_state(
        &self,
        registry: &EntityRegistry,
        state: &GameState,
    ) -> Result<PendingState, StateError> {
        let steps = self
            .persisters
            .iter()
            .map(|persister| persister.decode_state(registry, state))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PendingState { steps })
    }

    /// Decode `state` and apply it to `world`.
    ///
    /// # Errors
    ///
    /// See [`GamePersister::decode_state`]; `world` is untouched on error.
    pub fn read_state(
        &self,
        world: &mut World,
        registry: &EntityRegistry,
        state: &GameState,
    ) -> Result<(), StateError> {
        self.decode_state(registry, state)?.apply(world);
        Ok(())
    }
}

impl std::fmt::Debug for GamePersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamePersister")
            .field("persisters", &self.persisters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use engine_entity::{Entity, EntityCategory};
    use engine_math::Vec2;

    use super::*;

    struct Marker;

    impl Entity for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }
        fn category(&self) -> EntityCategory {
            EntityCategory::Effect
        }
        fn position(&self) -> Vec2 {
            Vec2::ZERO
        }
        fn set_position(&mut self, _position: Vec2) {}
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Saves how many entities were live and recreates that many markers.
    struct CountPersister(&'static str);

    impl Persister for CountPersister {
        fn write_state(&self, world: &World, state: &mut GameState) -> Result<(), StateError> {
            state.put_int(self.0, world.len() as i64);
            Ok(())
        }

        fn decode_state(
            &self,
            _registry: &EntityRegistry,
            state: &GameState,
        ) -> Result<Restore, StateError> {
            let count = state.get_int(self.0)?;
            Ok(Box::new(move |world: &mut World| {
                for _ in 0..count {
                    world.add(Box::new(Marker));
                }
            }))
        }
    }

    #[test]
    fn test_write_then_read_through_collection() {
        let mut persister = GamePersister::new();
        persister.register(Box::new(CountPersister("count")));
        let mut world = World::new();
        world.add(Box::new(Marker));
        world.add(Box::new(Marker));

        let mut state = GameState::new();
        persister.write_state(&world, &mut state).unwrap();
        assert_eq!(state.get_int("count").unwrap(), 2);

        let mut restored = World::new();
        persister
            .read_state(&mut restored, &EntityRegistry::new(), &state)
            .unwrap();
        assert_eq!(restored.len(), 2);
        persister.reset_state();
        assert_eq!(persister.len(), 1);
    }

    #[test]
    fn test_failed_decode_applies_nothing() {
        let mut persister = GamePersister::new();
        persister.register(Box::new(CountPersister("first")));
        persister.register(Box::new(CountPersister("second")));

        let mut state = GameState::new();
        state.put_int("first", 3);

        let mut world = World::new();
        let err = persister
            .read_state(&mut world, &EntityRegistry::new(), &state)
            .unwrap_err();
        assert!(matches!(err, StateError::Missing(key) if key == "second"));
        assert!(world.is_empty());
    }

    #[test]
    fn test_decoded_state_applies_later() {
        let mut persister = GamePersister::new();
        persister.register(Box::new(CountPersister("count")));
        let mut state = GameState::new();
        state.put_int("count", 1);

        let pending = persister.decode_state(&EntityRegistry::new(), &state).unwrap();
        let mut world = World::new();
        assert!(world.is_empty());
        pending.apply(&mut world);
        assert_eq!(world.len(), 1);
    }
}
