//! Target tracking shared by towers and homing shots.
//!
//! A [`TargetTracker`] binds its owner to at most one target entity. The
//! owner is registered as a listener on the target exactly while the target
//! is set, so it hears about the target's removal and can react once.

use engine_entity::{EntityContext, EntityId};

/// Where a tracker stands with respect to its current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No target.
    Unarmed,
    /// Following a target that has not been reached.
    Tracking,
    /// The target was reached; its removal will not be reported as lost.
    Reached,
}

/// Outcome of a removal notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEvent {
    /// The target disappeared before it was reached.
    Lost(EntityId),
    /// The target disappeared after it was reached.
    Suppressed(EntityId),
    /// The notification was about some other entity.
    Ignored,
}

/// At most one target, plus whether it has been reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetTracker {
    target: Option<EntityId>,
    reached: bool,
}

impl TargetTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    #[must_use]
    pub fn state(&self) -> TrackerState {
        match (self.target, self.reached) {
            (None, _) => TrackerState::Unarmed,
            (Some(_), false) => TrackerState::Tracking,
            (Some(_), true) => TrackerState::Reached,
        }
    }

    /// Point the tracker at `target`, or disarm it with `None`.
    ///
    /// Deregisters from the previous target first and clears the reached
    /// flag. Returns `false` if `target` is not a live entity, in which case
    /// the tracker is left unarmed.
    pub fn set_target(&mut self, ctx: &mut EntityContext<'_>, target: Option<EntityId>) -> bool {
        if let Some(previous) = self.target.take() {
            ctx.stop_listening_to(previous);
        }
        self.reached = false;

        let Some(target) = target else {
            return true;
        };
        if ctx.listen_to(target) {
            self.target = Some(target);
            true
        } else {
            false
        }
    }

    /// Record that the current target was reached.
    ///
    /// Returns `false` if there is no target or it was already reached.
    pub fn mark_reached(&mut self) -> bool {
        if self.state() != TrackerState::Tracking {
            return false;
        }
        self.reached = true;
        true
    }

    /// Handle a removal notification.
    ///
    /// The listener registration died with the removed entity, so the tracker
    /// simply forgets its target.
    pub fn target_removed(&mut self, removed: EntityId) -> TargetEvent {
        if self.target != Some(removed) {
            return TargetEvent::Ignored;
        }
        self.target = None;
        if self.reached {
            TargetEvent::Suppressed(removed)
        } else {
            TargetEvent::Lost(removed)
        }
    }

    /// Disarm and deregister. Owners call this from `clean`.
    pub fn release(&mut self, ctx: &mut EntityContext<'_>) {
        self.set_target(ctx, None);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::any::Any;
    use std::sync::{Arc, Mutex};

    use engine_entity::{Entity, EntityCategory, EntityError, World};
    use engine_math::Vec2;

    use super::*;

    /// A stationary target.
    pub(crate) struct Dummy(pub Vec2);

    impl Entity for Dummy {
        fn name(&self) -> &'static str {
            "dummy"
        }
        fn category(&self) -> EntityCategory {
            EntityCategory::Enemy
        }
        fn position(&self) -> Vec2 {
            self.0
        }
        fn set_position(&mut self, position: Vec2) {
            self.0 = position;
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Retargets on every tick it is told to and records removal events.
    struct Watcher {
        tracker: TargetTracker,
        retarget: Option<Option<EntityId>>,
        events: Events,
    }

    impl Entity for Watcher {
        fn name(&self) -> &'static str {
            "watcher"
        }
        fn category(&self) -> EntityCategory {
            EntityCategory::Effect
        }
        fn position(&self) -> Vec2 {
            Vec2::ZERO
        }
        fn set_position(&mut self, _position: Vec2) {}

        fn tick(&mut self, ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
            if let Some(target) = self.retarget.take() {
                self.tracker.set_target(ctx, target);
            }
            Ok(())
        }

        fn clean(&mut self, ctx: &mut EntityContext<'_>) {
            self.tracker.release(ctx);
        }

        fn entity_removed(&mut self, removed: EntityId, _ctx: &mut EntityContext<'_>) {
            let event = self.tracker.target_removed(removed);
            self.events.lock().unwrap().push(event);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    type Events = Arc<Mutex<Vec<TargetEvent>>>;

    fn watcher(world: &mut World, target: Option<EntityId>) -> (EntityId, Events) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let id = world.add(Box::new(Watcher {
            tracker: TargetTracker::new(),
            retarget: Some(target),
            events: Arc::clone(&events),
        }));
        world.tick_all().unwrap();
        (id, events)
    }

    #[test]
    fn test_registered_iff_target_set() {
        let mut world = World::new();
        let a = world.add(Box::new(Dummy(Vec2::ZERO)));
        let b = world.add(Box::new(Dummy(Vec2::ONE)));
        let (id, _) = watcher(&mut world, Some(a));
        assert!(world.has_listener(a, id));
        assert_eq!(
            world.get_as::<Watcher>(id).unwrap().tracker.state(),
            TrackerState::Tracking
        );

        world.get_as_mut::<Watcher>(id).unwrap().retarget = Some(Some(b));
        world.tick_all().unwrap();
        assert!(!world.has_listener(a, id));
        assert!(world.has_listener(b, id));

        world.get_as_mut::<Watcher>(id).unwrap().retarget = Some(None);
        world.tick_all().unwrap();
        assert!(world.observed_by(id).is_empty());
        assert_eq!(
            world.get_as::<Watcher>(id).unwrap().tracker.state(),
            TrackerState::Unarmed
        );
    }

    #[test]
    fn test_dead_target_leaves_tracker_unarmed() {
        let mut world = World::new();
        let a = world.add(Box::new(Dummy(Vec2::ZERO)));
        world.remove(a);
        let (id, _) = watcher(&mut world, Some(a));
        assert_eq!(world.get_as::<Watcher>(id).unwrap().tracker.target(), None);
    }

    #[test]
    fn test_removal_reported_as_lost_once() {
        let mut world = World::new();
        let a = world.add(Box::new(Dummy(Vec2::ZERO)));
        let (_, events) = watcher(&mut world, Some(a));
        world.remove(a);
        world.tick_all().unwrap();
        assert_eq!(*events.lock().unwrap(), vec![TargetEvent::Lost(a)]);
    }

    #[test]
    fn test_removal_after_reach_is_suppressed() {
        let mut world = World::new();
        let a = world.add(Box::new(Dummy(Vec2::ZERO)));
        let (id, events) = watcher(&mut world, Some(a));
        assert!(world.get_as_mut::<Watcher>(id).unwrap().tracker.mark_reached());
        assert!(!world.get_as_mut::<Watcher>(id).unwrap().tracker.mark_reached());

        world.remove(a);
        assert_eq!(*events.lock().unwrap(), vec![TargetEvent::Suppressed(a)]);
    }

    #[test]
    fn test_retarget_clears_reached_flag() {
        let mut world = World::new();
        let a = world.add(Box::new(Dummy(Vec2::ZERO)));
        let b = world.add(Box::new(Dummy(Vec2::ONE)));
        let (id, events) = watcher(&mut world, Some(a));
        world.get_as_mut::<Watcher>(id).unwrap().tracker.mark_reached();

        world.get_as_mut::<Watcher>(id).unwrap().retarget = Some(Some(b));
        world.tick_all().unwrap();
        assert_eq!(
            world.get_as::<Watcher>(id).unwrap().tracker.state(),
            TrackerState::Tracking
        );

        // The old target no longer reaches the watcher at all.
        world.remove(a);
        world.remove(b);
        assert_eq!(*events.lock().unwrap(), vec![TargetEvent::Lost(b)]);
    }

    #[test]
    fn test_clean_deregisters() {
        let mut world = World::new();
        let a = world.add(Box::new(Dummy(Vec2::ZERO)));
        let (id, events) = watcher(&mut world, Some(a));
        world.remove(id);
        assert_eq!(world.listener_count(a), 0);
        world.remove(a);
        assert!(events.lock().unwrap().is_empty());
    }
}
