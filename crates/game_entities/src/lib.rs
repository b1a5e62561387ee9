//! Tower-defense entities.
//!
//! [`TargetTracker`] is the shared core of target following: [`Aimer`] uses
//! it to keep towers pointed at enemies and [`Homing`] to steer projectiles.
//! The concrete entities are registered by name with
//! [`register_entities`] and saved by the [`EntityPersister`]s.

pub mod aimer;
pub mod canon;
pub mod canon_shot;
pub mod enemy;
pub mod homing;
pub mod persister;
pub mod plateau;
pub mod tracker;

use engine_entity::EntityRegistry;

pub use aimer::{Aimer, TargetStrategy};
pub use canon::{CANON, Canon, SHOT_SPAWN_OFFSET};
pub use canon_shot::{CANON_SHOT, CanonShot};
pub use enemy::{Enemy, SOLDIER};
pub use homing::{Homing, HomingStep};
pub use persister::{EntityPersister, EntityRecord, entity_persisters, register_persisters};
pub use plateau::{PLATEAU, Plateau};
pub use tracker::{TargetEvent, TargetTracker, TrackerState};

/// Register a constructor for every entity type in this crate.
pub fn register_entities(registry: &mut EntityRegistry) {
    registry.register(PLATEAU, || Box::new(Plateau::new()));
    registry.register(SOLDIER, || Box::new(Enemy::soldier()));
    registry.register(CANON, || Box::new(Canon::default()));
    registry.register(CANON_SHOT, || Box::new(CanonShot::default()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_is_registered_under_its_own_name() {
        let mut registry = EntityRegistry::new();
        register_entities(&mut registry);
        assert_eq!(registry.len(), 4);
        for name in [PLATEAU, SOLDIER, CANON, CANON_SHOT] {
            assert_eq!(registry.create(name).unwrap().name(), name);
        }
    }
}
