//! The basic tower.

use std::any::Any;

use engine_entity::{
    Entity, EntityCategory, EntityContext, EntityError, EntityId, TARGET_FRAME_RATE,
};
use engine_math::{Transform2D, Vec2, polar};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aimer::{Aimer, TargetStrategy};
use crate::canon_shot::CanonShot;

/// Factory name of the canon tower.
pub const CANON: &str = "canon";

/// Distance from the tower centre to the muzzle, in tiles.
pub const SHOT_SPAWN_OFFSET: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanonState {
    /// Frames until the next shot may be fired.
    cooldown: u32,
    strategy: TargetStrategy,
}

/// A tower that fires homing shots at the enemy its aimer selects.
#[derive(Debug, Clone)]
pub struct Canon {
    transform: Transform2D,
    aimer: Aimer,
    /// Seconds between shots.
    reload: f32,
    damage: f32,
    shot_speed: f32,
    cooldown: u32,
}

impl Canon {
    #[must_use]
    pub fn new(range: f32, reload: f32, damage: f32) -> Self {
        Self {
            transform: Transform2D::IDENTITY,
            aimer: Aimer::new(range),
            reload,
            damage,
            shot_speed: CanonShot::DEFAULT_SPEED,
            cooldown: 0,
        }
    }

    #[must_use]
    pub fn aimer(&self) -> &Aimer {
        &self.aimer
    }

    pub fn aimer_mut(&mut self) -> &mut Aimer {
        &mut self.aimer
    }

    /// Frames until the next shot may be fired.
    #[must_use]
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    fn reload_frames(&self) -> u32 {
        (self.reload * TARGET_FRAME_RATE as f32).round() as u32
    }

    fn fire(&mut self, target: EntityId, ctx: &mut EntityContext<'_>) {
        let origin = self
            .transform
            .translated(polar(SHOT_SPAWN_OFFSET, self.transform.angle))
            .position;
        let shot = CanonShot::aimed_at(origin, target, self.shot_speed, self.damage);
        ctx.add(Box::new(shot));
        self.cooldown = self.reload_frames();
    }
}

impl Default for Canon {
    fn default() -> Self {
        Self::new(3.5, 1.0, CanonShot::DEFAULT_DAMAGE)
    }
}

impl Entity for Canon {
    fn name(&self) -> &'static str {
        CANON
    }

    fn category(&self) -> EntityCategory {
        EntityCategory::Tower
    }

    fn position(&self) -> Vec2 {
        self.transform.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    fn tick(&mut self, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        self.aimer.update(self.transform.position, ctx);
        if let Some(target) = self.aimer.target() {
            if let Some(position) = ctx.position_of(target) {
                self.transform.angle = self.transform.angle_to(position);
            }
            if self.cooldown == 0 {
                self.fire(target, ctx);
            }
        }
        self.cooldown = self.cooldown.saturating_sub(1);
        Ok(())
    }

    fn clean(&mut self, ctx: &mut EntityContext<'_>) {
        self.aimer.release(ctx);
    }

    fn entity_removed(&mut self, removed: EntityId, _ctx: &mut EntityContext<'_>) {
        self.aimer.target_removed(removed);
    }

    fn write_state(&self) -> Value {
        let state = CanonState {
            cooldown: self.cooldown,
            strategy: self.aimer.strategy(),
        };
        serde_json::to_value(state).unwrap_or(Value::Null)
    }

    fn read_state(&mut self, state: &Value) -> Result<(), EntityError> {
        let state = CanonState::deserialize(state).map_err(|source| EntityError::State {
            name: CANON,
            source,
        })?;
        self.cooldown = state.cooldown;
        self.aimer.set_strategy(state.strategy);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use engine_entity::World;

    use super::*;
    use crate::enemy::Enemy;

    fn shots(world: &World) -> usize {
        world.by_category(EntityCategory::Shot).count()
    }

    #[test]
    fn test_fires_at_enemy_in_range_then_reloads() {
        let mut world = World::new();
        let mut enemy = Enemy::new(1000.0, 0.0);
        enemy.set_position(Vec2::new(3.0, 0.0));
        world.add(Box::new(enemy));
        // 0.1s reload = 3 frames.
        world.add(Box::new(Canon::new(5.0, 0.1, 1.0)));

        world.tick_all().unwrap();
        assert_eq!(shots(&world), 1);
        world.tick_all().unwrap();
        world.tick_all().unwrap();
        assert_eq!(shots(&world), 1);
        world.tick_all().unwrap();
        assert_eq!(shots(&world), 2);
    }

    #[test]
    fn test_shot_leaves_from_the_muzzle() {
        let mut world = World::new();
        let mut enemy = Enemy::new(1000.0, 0.0);
        enemy.set_position(Vec2::new(0.0, 3.0));
        world.add(Box::new(enemy));
        world.add(Box::new(Canon::default()));

        world.tick_all().unwrap();
        let (_, shot) = world.by_category(EntityCategory::Shot).next().unwrap();
        // Spawned at the muzzle, then moved one step on its first tick at most.
        let position = shot.position();
        assert!(position.x.abs() < 1e-4);
        assert!(position.y >= SHOT_SPAWN_OFFSET - 1e-4);
        assert!(position.y <= SHOT_SPAWN_OFFSET + CanonShot::DEFAULT_SPEED / 30.0 + 1e-4);
    }

    #[test]
    fn test_idle_without_enemies() {
        let mut world = World::new();
        let canon = world.add(Box::new(Canon::default()));
        world.tick_all().unwrap();
        assert_eq!(shots(&world), 0);
        assert!(world.get_as::<Canon>(canon).unwrap().aimer().target().is_none());
    }

    #[test]
    fn test_kills_enemy_and_stops_firing() {
        let mut world = World::new();
        let mut enemy = Enemy::new(30.0, 0.0);
        enemy.set_position(Vec2::new(1.0, 0.0));
        let enemy = world.add(Box::new(enemy));
        let canon = world.add(Box::new(Canon::new(5.0, 0.1, 25.0)));

        for _ in 0..60 {
            world.tick_all().unwrap();
        }
        assert!(!world.is_alive(enemy));
        assert_eq!(shots(&world), 0);
        assert!(world.get_as::<Canon>(canon).unwrap().aimer().target().is_none());
    }

    #[test]
    fn test_state_keeps_cooldown_and_strategy() {
        let mut canon = Canon::default();
        canon.cooldown = 7;
        canon.aimer_mut().set_strategy(TargetStrategy::Strongest);

        let mut restored = Canon::default();
        restored.read_state(&canon.write_state()).unwrap();
        assert_eq!(restored.cooldown, 7);
        assert_eq!(restored.aimer().strategy(), TargetStrategy::Strongest);
    }
}
