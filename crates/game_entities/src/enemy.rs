//! Enemies walking the map's paths.

use std::any::Any;

use engine_entity::{Entity, EntityCategory, EntityContext, EntityError, TARGET_FRAME_RATE};
use engine_math::{Transform2D, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Factory name of the basic enemy.
pub const SOLDIER: &str = "soldier";

/// Persisted part of an enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnemyState {
    health: f32,
    max_health: f32,
    speed: f32,
    waypoints: Vec<Vec2>,
    next_waypoint: usize,
}

/// An enemy that follows a list of waypoints and leaves the map at the end.
#[derive(Debug, Clone)]
pub struct Enemy {
    transform: Transform2D,
    state: EnemyState,
}

impl Enemy {
    #[must_use]
    pub fn new(health: f32, speed: f32) -> Self {
        Self {
            transform: Transform2D::IDENTITY,
            state: EnemyState {
                health,
                max_health: health,
                speed,
                waypoints: Vec::new(),
                next_waypoint: 0,
            },
        }
    }

    /// The stock enemy registered under [`SOLDIER`].
    #[must_use]
    pub fn soldier() -> Self {
        Self::new(100.0, 1.0)
    }

    /// Place the enemy at the start of `waypoints` and walk them in order.
    pub fn set_path(&mut self, waypoints: Vec<Vec2>) {
        if let Some(&start) = waypoints.first() {
            self.transform.position = start;
        }
        self.state.next_waypoint = 1_usize.min(waypoints.len());
        self.state.waypoints = waypoints;
    }

    #[must_use]
    pub fn health(&self) -> f32 {
        self.state.health
    }

    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.state.max_health
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state.health <= 0.0
    }

    /// Returns `true` once the last waypoint has been reached.
    #[must_use]
    pub fn has_escaped(&self) -> bool {
        !self.state.waypoints.is_empty() && self.state.next_waypoint >= self.state.waypoints.len()
    }

    /// Apply `amount` of damage. Returns `true` if this killed the enemy.
    pub fn damage(&mut self, amount: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.state.health -= amount;
        self.is_dead()
    }
}

impl Entity for Enemy {
    fn name(&self) -> &'static str {
        SOLDIER
    }

    fn category(&self) -> EntityCategory {
        EntityCategory::Enemy
    }

    fn position(&self) -> Vec2 {
        self.transform.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    fn tick(&mut self, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
        if self.is_dead() {
            ctx.remove_self();
            return Ok(());
        }

        let Some(&waypoint) = self.state.waypoints.get(self.state.next_waypoint) else {
            return Ok(());
        };
        let step = self.state.speed / TARGET_FRAME_RATE as f32;
        self.transform.angle = self.transform.angle_to(waypoint);
        if self.transform.step_towards(waypoint, step) {
            self.state.next_waypoint += 1;
            if self.has_escaped() {
                debug!(id = %ctx.id(), "enemy reached the end of its path");
                ctx.remove_self();
            }
        }
        Ok(())
    }

    fn write_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn read_state(&mut self, state: &Value) -> Result<(), EntityError> {
        self.state = EnemyState::deserialize(state).map_err(|source| EntityError::State {
            name: SOLDIER,
            source,
        })?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
