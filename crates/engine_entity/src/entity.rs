//! The [`Entity`] trait and its identity tags.
//!
//! Every simulation object implements [`Entity`]. The world drives the
//! lifecycle: [`Entity::init`] runs inside the same call that inserts the
//! entity, [`Entity::tick`] runs once per frame while the entity is live, and
//! [`Entity::clean`] runs inside the same call that removes it. An entity is
//! therefore never ticked before `init` nor after `clean`.

use std::any::Any;

use engine_math::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::EntityContext;
use crate::error::EntityError;
use crate::id::EntityId;

/// Logical frames per second the simulation is advanced at.
///
/// Per-tick quantities (movement, reload timers, homing reach distance) are
/// derived from per-second values by dividing by this rate.
pub const TARGET_FRAME_RATE: u32 = 30;

/// Coarse classification of entities, used for queries and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityCategory {
    /// Buildable plots placed by the map.
    Plateau,
    /// Player-built towers.
    Tower,
    /// Enemies walking the map's paths.
    Enemy,
    /// Projectiles fired by towers.
    Shot,
    /// Short-lived effects (explosions and the like).
    Effect,
}

/// A polymorphic simulation object.
///
/// # Examples
///
/// ```rust
/// use std::any::Any;
///
/// use engine_entity::{Entity, EntityCategory, EntityContext, EntityError, World};
/// use engine_math::Vec2;
///
/// struct Marker {
///     position: Vec2,
///     ticks: u32,
/// }
///
/// impl Entity for Marker {
///     fn name(&self) -> &'static str { "marker" }
///     fn category(&self) -> EntityCategory { EntityCategory::Effect }
///     fn position(&self) -> Vec2 { self.position }
///     fn set_position(&mut self, position: Vec2) { self.position = position; }
///
///     fn tick(&mut self, _ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
///         self.ticks += 1;
///         Ok(())
///     }
///
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
///
/// let mut world = World::new();
/// let id = world.add(Box::new(Marker { position: Vec2::ZERO, ticks: 0 }));
/// world.tick_all().unwrap();
/// assert_eq!(world.get_as::<Marker>(id).unwrap().ticks, 1);
/// ```
pub trait Entity: Any + Send {
    /// Factory type name (e.g. `"canon"`).
    fn name(&self) -> &'static str;

    /// The entity's category.
    fn category(&self) -> EntityCategory;

    /// Current world-space position.
    fn position(&self) -> Vec2;

    /// Move the entity to `position`.
    fn set_position(&mut self, position: Vec2);

    /// Called once when the entity enters the world.
    fn init(&mut self, _ctx: &mut EntityContext<'_>) {}

    /// Called once per frame while the entity is live.
    ///
    /// # Errors
    ///
    /// An error aborts the remainder of the current frame.
    fn tick(&mut self, _ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        Ok(())
    }

    /// Called once when the entity leaves the world.
    fn clean(&mut self, _ctx: &mut EntityContext<'_>) {}

    /// Called when an entity this one listens to has been removed.
    fn entity_removed(&mut self, _removed: EntityId, _ctx: &mut EntityContext<'_>) {}

    /// Entity-specific state to persist alongside name and position.
    fn write_state(&self) -> Value {
        Value::Null
    }

    /// Restore state produced by [`Entity::write_state`].
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::State`] if the value cannot be decoded.
    fn read_state(&mut self, _state: &Value) -> Result<(), EntityError> {
        Ok(())
    }

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
