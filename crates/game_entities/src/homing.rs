//! Homing movement for projectiles.

use engine_entity::{EntityContext, EntityId, TARGET_FRAME_RATE, World};
use engine_math::Transform2D;

use crate::tracker::{TargetEvent, TargetTracker, TrackerState};

/// What a homing step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingStep {
    /// No target to follow, or the target was already reached.
    Idle,
    /// Moved one frame's distance towards the target.
    Moving,
    /// Arrived at the target this frame.
    Reached(EntityId),
}

/// Moves its owner towards a tracked target at a fixed speed.
#[derive(Debug, Clone, PartialEq)]
pub struct Homing {
    tracker: TargetTracker,
    /// Units per second.
    speed: f32,
}

impl Homing {
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            tracker: TargetTracker::new(),
            speed,
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &TargetTracker {
        &self.tracker
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Distance covered in one frame.
    #[must_use]
    pub fn step_length(&self) -> f32 {
        self.speed / TARGET_FRAME_RATE as f32
    }

    /// See [`TargetTracker::set_target`].
    pub fn set_target(&mut self, ctx: &mut EntityContext<'_>, target: Option<EntityId>) -> bool {
        self.tracker.set_target(ctx, target)
    }

    /// Advance one frame towards the target.
    ///
    /// The target counts as reached when it is within one frame's distance,
    /// in which case `transform` snaps onto it.
    pub fn advance(&mut self, transform: &mut Transform2D, world: &World) -> HomingStep {
        if self.tracker.state() != TrackerState::Tracking {
            return HomingStep::Idle;
        }
        let Some(target) = self.tracker.target() else {
            return HomingStep::Idle;
        };
        // A target removed this frame is reported once the hook returns.
        let Some(destination) = world.position_of(target) else {
            return HomingStep::Idle;
        };

        transform.angle = transform.angle_to(destination);
        let step = self.step_length();
        if transform.distance_to(destination) <= step {
            transform.position = destination;
            self.tracker.mark_reached();
            return HomingStep::Reached(target);
        }
        transform.step_towards(destination, step);
        HomingStep::Moving
    }

    /// See [`TargetTracker::target_removed`].
    pub fn target_removed(&mut self, removed: EntityId) -> TargetEvent {
        self.tracker.target_removed(removed)
    }

    /// See [`TargetTracker::release`].
    pub fn release(&mut self, ctx: &mut EntityContext<'_>) {
        self.tracker.release(ctx);
    }
}
