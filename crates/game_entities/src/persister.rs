//! Saving and restoring entities by category.

use engine_entity::{EntityCategory, EntityRegistry, World};
use engine_logic::{GameEngine, GameState, Persister, Restore, StateError};
use engine_math::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// One saved entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub position: Vec2,
    #[serde(default)]
    pub state: Value,
}

/// Writes every entity of one category under a single state key and
/// recreates them through the factory registry on load.
#[derive(Debug, Clone)]
pub struct EntityPersister {
    key: &'static str,
    category: EntityCategory,
}

impl EntityPersister {
    #[must_use]
    pub fn new(key: &'static str, category: EntityCategory) -> Self {
        Self { key, category }
    }

    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl Persister for EntityPersister {
    fn write_state(&self, world: &World, state: &mut GameState) -> Result<(), StateError> {
        let records: Vec<EntityRecord> = world
            .by_category(self.category)
            .map(|(_, entity)| EntityRecord {
                name: entity.name().to_string(),
                position: entity.position(),
                state: entity.write_state(),
            })
            .collect();
        debug!(key = self.key, count = records.len(), "writing entities");
        state.put_value(self.key, &records)
    }

    fn decode_state(
        &self,
        registry: &EntityRegistry,
        state: &GameState,
    ) -> Result<Restore, StateError> {
        let records: Vec<EntityRecord> = state.get_value(self.key).map_err(|err| match err {
            StateError::Json(_) => StateError::WrongType {
                key: self.key.to_string(),
                expected: "a list of entity records",
            },
            other => other,
        })?;
        debug!(key = self.key, count = records.len(), "decoding entities");

        let mut entities = Vec::with_capacity(records.len());
        for record in &records {
            let mut entity = registry.create(&record.name)?;
            entity.set_position(record.position);
            entity.read_state(&record.state)?;
            entities.push(entity);
        }
        Ok(Box::new(move |world: &mut World| {
            for entity in entities {
                world.add(entity);
            }
        }))
    }
}

/// Persisters for plateaus, towers and enemies, in restore order.
///
/// Shots and effects are transient and never saved.
#[must_use]
pub fn entity_persisters() -> [EntityPersister; 3] {
    [
        EntityPersister::new("plateaus", EntityCategory::Plateau),
        EntityPersister::new("towers", EntityCategory::Tower),
        EntityPersister::new("enemies", EntityCategory::Enemy),
    ]
}

/// Register [`entity_persisters`] with `engine`.
pub fn register_persisters(engine: &mut GameEngine) {
    for persister in entity_persisters() {
        engine.register_persister(Box::new(persister));
    }
}
