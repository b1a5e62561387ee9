//! Homing projectile fired by canon towers.

use std::any::Any;

use engine_entity::{Entity, EntityCategory, EntityContext, EntityError, EntityId};
use engine_math::{Transform2D, Vec2};
use tracing::trace;

use crate::enemy::Enemy;
use crate::homing::{Homing, HomingStep};
use crate::tracker::TargetEvent;

/// Factory name of the canon projectile.
pub const CANON_SHOT: &str = "canon_shot";

/// Flies at one enemy, damages it on arrival and disappears.
///
/// A shot whose target vanishes before it arrives disappears as well.
#[derive(Debug, Clone)]
pub struct CanonShot {
    transform: Transform2D,
    homing: Homing,
    damage: f32,
    /// Target handed over at construction, armed in `init`.
    launch_target: Option<EntityId>,
}

impl CanonShot {
    pub const DEFAULT_SPEED: f32 = 4.0;
    pub const DEFAULT_DAMAGE: f32 = 25.0;

    #[must_use]
    pub fn new(speed: f32, damage: f32) -> Self {
        Self {
            transform: Transform2D::IDENTITY,
            homing: Homing::new(speed),
            damage,
            launch_target: None,
        }
    }

    /// A shot starting at `origin` that will home in on `target` once added.
    #[must_use]
    pub fn aimed_at(origin: Vec2, target: EntityId, speed: f32, damage: f32) -> Self {
        let mut shot = Self::new(speed, damage);
        shot.transform = Transform2D::from_position(origin);
        shot.launch_target = Some(target);
        shot
    }

    #[must_use]
    pub fn homing(&self) -> &Homing {
        &self.homing
    }

    fn target_reached(&mut self, target: EntityId, ctx: &mut EntityContext<'_>) {
        let killed = ctx
            .get_as_mut::<Enemy>(target)
            .is_some_and(|enemy| enemy.damage(self.damage));
        if killed {
            trace!(%target, "shot killed its target");
            ctx.remove(target);
        }
        ctx.remove_self();
    }
}

impl Default for CanonShot {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPEED, Self::DEFAULT_DAMAGE)
    }
}

impl Entity for CanonShot {
    fn name(&self) -> &'static str {
        CANON_SHOT
    }

    fn category(&self) -> EntityCategory {
        EntityCategory::Shot
    }

    fn position(&self) -> Vec2 {
        self.transform.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    fn init(&mut self, ctx: &mut EntityContext<'_>) {
        let target = self.launch_target.take();
        if !self.homing.set_target(ctx, target) || target.is_none() {
            ctx.remove_self();
        }
    }

    fn tick(&mut self, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        if let HomingStep::Reached(target) = self.homing.advance(&mut self.transform, ctx) {
            self.target_reached(target, ctx);
        }
        Ok(())
    }

    fn clean(&mut self, ctx: &mut EntityContext<'_>) {
        self.homing.release(ctx);
    }

    fn entity_removed(&mut self, removed: EntityId, ctx: &mut EntityContext<'_>) {
        if let TargetEvent::Lost(_) = self.homing.target_removed(removed) {
            ctx.remove_self();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
