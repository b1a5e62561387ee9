//! Target selection for towers.

use engine_entity::{Entity, EntityCategory, EntityContext, EntityId, World};
use engine_math::Vec2;
use serde::{Deserialize, Serialize};

use crate::enemy::Enemy;
use crate::tracker::{TargetEvent, TargetTracker};

/// How a tower picks among enemies in range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStrategy {
    /// Nearest to the tower.
    #[default]
    Closest,
    /// Longest in the world.
    First,
    /// Most remaining health.
    Strongest,
}

/// Keeps a tower pointed at an enemy within range.
#[derive(Debug, Clone, PartialEq)]
pub struct Aimer {
    tracker: TargetTracker,
    range: f32,
    strategy: TargetStrategy,
}

impl Aimer {
    #[must_use]
    pub fn new(range: f32) -> Self {
        Self {
            tracker: TargetTracker::new(),
            range,
            strategy: TargetStrategy::default(),
        }
    }

    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.tracker.target()
    }

    #[must_use]
    pub fn range(&self) -> f32 {
        self.range
    }

    #[must_use]
    pub fn strategy(&self) -> TargetStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: TargetStrategy) {
        self.strategy = strategy;
    }

    /// Drop a target that left range and pick a new one if unarmed.
    pub fn update(&mut self, origin: Vec2, ctx: &mut EntityContext<'_>) {
        if let Some(target) = self.tracker.target() {
            if self.in_range(origin, ctx.position_of(target)) {
                return;
            }
            self.tracker.set_target(ctx, None);
        }

        if let Some(next) = self.find_target(origin, ctx) {
            self.tracker.set_target(ctx, Some(next));
        }
    }

    /// See [`TargetTracker::target_removed`]. A new target is picked on the
    /// next [`Aimer::update`].
    pub fn target_removed(&mut self, removed: EntityId) -> TargetEvent {
        self.tracker.target_removed(removed)
    }

    /// See [`TargetTracker::release`].
    pub fn release(&mut self, ctx: &mut EntityContext<'_>) {
        self.tracker.release(ctx);
    }

    fn in_range(&self, origin: Vec2, position: Option<Vec2>) -> bool {
        position.is_some_and(|position| position.distance(origin) <= self.range)
    }

    fn find_target(&self, origin: Vec2, world: &World) -> Option<EntityId> {
        let mut candidates = world
            .by_category(EntityCategory::Enemy)
            .filter(|(_, entity)| self.in_range(origin, Some(entity.position())));

        match self.strategy {
            TargetStrategy::First => candidates.next().map(|(id, _)| id),
            TargetStrategy::Closest => candidates
                .min_by(|(_, a), (_, b)| {
                    a.position()
                        .distance(origin)
                        .total_cmp(&b.position().distance(origin))
                })
                .map(|(id, _)| id),
            TargetStrategy::Strongest => candidates
                .max_by(|(_, a), (_, b)| health(*a).total_cmp(&health(*b)))
                .map(|(id, _)| id),
        }
    }
}

fn health(entity: &dyn Entity) -> f32 {
    entity
        .as_any()
        .downcast_ref::<Enemy>()
        .map_or(0.0, Enemy::health)
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use engine_entity::EntityError;

    use super::*;

    struct Tower {
        position: Vec2,
        aimer: Aimer,
    }

    impl Entity for Tower {
        fn name(&self) -> &'static str {
            "tower"
        }
        fn category(&self) -> EntityCategory {
            EntityCategory::Tower
        }
        fn position(&self) -> Vec2 {
            self.position
        }
        fn set_position(&mut self, position: Vec2) {
            self.position = position;
        }
        fn tick(&mut self, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
            self.aimer.update(self.position, ctx);
            Ok(())
        }
        fn clean(&mut self, ctx: &mut EntityContext<'_>) {
            self.aimer.release(ctx);
        }
        fn entity_removed(&mut self, removed: EntityId, _ctx: &mut EntityContext<'_>) {
            self.aimer.target_removed(removed);
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn enemy_at(world: &mut World, position: Vec2, health: f32) -> EntityId {
        let mut enemy = Enemy::new(health, 0.0);
        enemy.set_position(position);
        world.add(Box::new(enemy))
    }

    fn tower(world: &mut World, strategy: TargetStrategy) -> EntityId {
        let mut aimer = Aimer::new(5.0);
        aimer.set_strategy(strategy);
        world.add(Box::new(Tower {
            position: Vec2::ZERO,
            aimer,
        }))
    }

    fn target_of(world: &World, tower: EntityId) -> Option<EntityId> {
        world.get_as::<Tower>(tower).unwrap().aimer.target()
    }

    #[test]
    fn test_picks_closest_in_range() {
        let mut world = World::new();
        enemy_at(&mut world, Vec2::new(4.0, 0.0), 10.0);
        let near = enemy_at(&mut world, Vec2::new(2.0, 0.0), 10.0);
        enemy_at(&mut world, Vec2::new(9.0, 0.0), 10.0);
        let tower = tower(&mut world, TargetStrategy::Closest);

        world.tick_all().unwrap();
        assert_eq!(target_of(&world, tower), Some(near));
        assert!(world.has_listener(near, tower));
    }

    #[test]
    fn test_first_and_strongest_strategies() {
        let mut world = World::new();
        let first = enemy_at(&mut world, Vec2::new(4.0, 0.0), 10.0);
        let strong = enemy_at(&mut world, Vec2::new(3.0, 0.0), 80.0);
        let by_age = tower(&mut world, TargetStrategy::First);
        let by_health = tower(&mut world, TargetStrategy::Strongest);

        world.tick_all().unwrap();
        assert_eq!(target_of(&world, by_age), Some(first));
        assert_eq!(target_of(&world, by_health), Some(strong));
    }

    #[test]
    fn test_nothing_in_range() {
        let mut world = World::new();
        enemy_at(&mut world, Vec2::new(50.0, 0.0), 10.0);
        let tower = tower(&mut world, TargetStrategy::Closest);
        world.tick_all().unwrap();
        assert_eq!(target_of(&world, tower), None);
    }

    #[test]
    fn test_drops_target_that_left_range() {
        let mut world = World::new();
        let enemy = enemy_at(&mut world, Vec2::new(2.0, 0.0), 10.0);
        let tower = tower(&mut world, TargetStrategy::Closest);
        world.tick_all().unwrap();

        world.get_mut(enemy).unwrap().set_position(Vec2::new(20.0, 0.0));
        world.tick_all().unwrap();
        assert_eq!(target_of(&world, tower), None);
        assert_eq!(world.listener_count(enemy), 0);
    }

    #[test]
    fn test_retargets_after_removal() {
        let mut world = World::new();
        let near = enemy_at(&mut world, Vec2::new(1.0, 0.0), 10.0);
        let far = enemy_at(&mut world, Vec2::new(3.0, 0.0), 10.0);
        let tower = tower(&mut world, TargetStrategy::Closest);
        world.tick_all().unwrap();

        world.remove(near);
        assert_eq!(target_of(&world, tower), None);
        world.tick_all().unwrap();
        assert_eq!(target_of(&world, tower), Some(far));
    }
}
