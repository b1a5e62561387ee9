//! The simulation engine.
//!
//! A [`GameEngine`] owns the entity [`World`], the active configuration, the
//! command queue, the persisters and the error listeners. Whoever holds
//! `&mut GameEngine` is the single writer; other threads go through an
//! [`EngineHandle`].
//!
//! ## Tick lifecycle
//!
//! 1. Drain queued commands in the order they were posted.
//! 2. Tick every entity that is live at the start of this phase.
//! 3. Advance the loop counter.
//!
//! A failure in step 1 or 2 (an error or a panic) aborts the rest of the tick
//! and is reported to every [`ErrorListener`]. Commands that did not run stay
//! queued for the next tick.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use engine_entity::{Entity, EntityError, EntityId, EntityRegistry, World};
use tracing::{debug, error, trace, warn};

use crate::config::GameConfiguration;
use crate::error::{EngineError, ErrorListener, StateError};
use crate::handle::EngineHandle;
use crate::message::Message;
use crate::persister::{GamePersister, PendingState, Persister};
use crate::state::GameState;

/// The single-writer simulation engine.
pub struct GameEngine {
    world: World,
    registry: Arc<EntityRegistry>,
    configuration: Option<Arc<GameConfiguration>>,
    persister: GamePersister,
    error_listeners: Vec<Arc<dyn ErrorListener>>,
    receiver: Receiver<Message>,
    handle: EngineHandle,
    /// Ticks completed since creation or the last clear.
    loop_count: u64,
}

impl GameEngine {
    /// Create an engine owned by the calling thread.
    #[must_use]
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = EngineHandle::new(sender, thread::current().id());
        Self {
            world: World::new(),
            registry,
            configuration: None,
            persister: GamePersister::new(),
            error_listeners: Vec::new(),
            receiver,
            handle,
            loop_count: 0,
        }
    }

    /// A handle other threads can use to reach this engine.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// See [`EngineHandle::is_thread_change_needed`].
    #[must_use]
    pub fn is_thread_change_needed(&self) -> bool {
        self.handle.is_thread_change_needed()
    }

    /// Enqueue a command for the next tick.
    ///
    /// # Errors
    ///
    /// Never fails while the engine is alive; the signature mirrors
    /// [`EngineHandle::post`].
    pub fn post<F>(&self, name: &'static str, command: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut GameEngine) -> Result<(), EngineError> + Send + 'static,
    {
        self.handle.post(name, command)
    }

    // -- Entities --

    /// Insert an entity and run its `init` hook.
    pub fn add(&mut self, entity: Box<dyn Entity>) -> EntityId {
        self.world.add(entity)
    }

    /// Remove an entity, running its `clean` hook.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.world.remove(id)
    }

    /// Remove every entity and reset the loop counter.
    pub fn clear(&mut self) {
        debug!(entities = self.world.len(), "clearing engine");
        self.world.clear();
        self.loop_count = 0;
    }

    /// Construct an entity by type name.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnknownType`] for unregistered names.
    pub fn create_entity(&self, name: &str) -> Result<Box<dyn Entity>, EntityError> {
        self.registry.create(name)
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // -- Configuration --

    pub fn set_configuration(&mut self, configuration: Arc<GameConfiguration>) {
        debug!(map = %configuration.map().id, "configuration installed");
        self.configuration = Some(configuration);
    }

    #[must_use]
    pub fn configuration(&self) -> Option<&Arc<GameConfiguration>> {
        self.configuration.as_ref()
    }

    /// Ticks completed since creation or the last [`GameEngine::clear`].
    #[must_use]
    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    // -- Persistence --

    pub fn register_persister(&mut self, persister: Box<dyn Persister>) {
        self.persister.register(persister);
    }

    /// # Errors
    ///
    /// Propagates the first persister failure.
    pub fn write_state(&self, state: &mut GameState) -> Result<(), StateError> {
        self.persister.write_state(&self.world, state)
    }

    /// Decode `state` through every persister without touching the world.
    ///
    /// # Errors
    ///
    /// Propagates the first persister failure.
    pub fn decode_state(&self, state: &GameState) -> Result<PendingState, StateError> {
        self.persister.decode_state(&self.registry, state)
    }

    pub fn apply_state(&mut self, pending: PendingState) {
        pending.apply(&mut self.world);
    }

    /// [`GameEngine::decode_state`] then [`GameEngine::apply_state`].
    ///
    /// # Errors
    ///
    /// Propagates the first persister failure; the world is untouched.
    pub fn read_state(&mut self, state: &GameState) -> Result<(), StateError> {
        let pending = self.decode_state(state)?;
        self.apply_state(pending);
        Ok(())
    }

    pub fn reset_state(&mut self) {
        self.persister.reset_state();
    }

    // -- Errors --

    pub fn register_error_listener(&mut self, listener: Arc<dyn ErrorListener>) {
        self.error_listeners.push(listener);
    }

    /// Returns `false` if `listener` was not registered.
    pub fn unregister_error_listener(&mut self, listener: &Arc<dyn ErrorListener>) -> bool {
        let before = self.error_listeners.len();
        self.error_listeners
            .retain(|registered| !Arc::ptr_eq(registered, listener));
        self.error_listeners.len() != before
    }

    // -- Ticking --

    /// Advance the simulation by one frame.
    ///
    /// # Errors
    ///
    /// Returns the failure that aborted this tick, after it has been reported
    /// to every registered [`ErrorListener`].
    pub fn tick(&mut self) -> Result<(), EngineError> {
        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.run_tick())) {
            Ok(result) => result,
            Err(payload) => {
                let discarded = self.world.discard_detached();
                if discarded > 0 {
                    warn!(discarded, "dropped entities caught in a panic");
                }
                Err(EngineError::Panicked(panic_message(payload.as_ref())))
            }
        };

        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    fn run_tick(&mut self) -> Result<(), EngineError> {
        while let Ok(message) = self.receiver.try_recv() {
            trace!(command = message.name(), "executing command");
            message.execute(self)?;
        }

        self.world.tick_all()?;
        self.loop_count += 1;
        Ok(())
    }

    fn report(&self, err: &EngineError) {
        error!(loop_count = self.loop_count, error = %err, "tick aborted");
        for listener in &self.error_listeners {
            listener.error(err, self.loop_count);
        }
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("world", &self.world)
            .field("loop_count", &self.loop_count)
            .field("error_listeners", &self.error_listeners.len())
            .field("persister", &self.persister)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use engine_entity::{EntityCategory, EntityContext};
    use engine_math::Vec2;

    use super::*;
    use crate::map::GameMap;

    type Log = Arc<Mutex<Vec<String>>>;

    #[derive(Clone, Copy, Default, PartialEq)]
    enum Mode {
        #[default]
        Normal,
        Fail,
        Panic,
    }

    struct Probe {
        label: &'static str,
        log: Log,
        mode: Mode,
    }

    impl Probe {
        fn boxed(label: &'static str, log: &Log, mode: Mode) -> Box<dyn Entity> {
            Box::new(Self {
                label,
                log: Arc::clone(log),
                mode,
            })
        }
    }

    impl Entity for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }
        fn category(&self) -> EntityCategory {
            EntityCategory::Effect
        }
        fn position(&self) -> Vec2 {
            Vec2::ZERO
        }
        fn set_position(&mut self, _position: Vec2) {}

        fn tick(&mut self, _ctx: &mut EntityContext<'_>) -> Result<(), EntityError> {
            self.log.lock().unwrap().push(format!("tick {}", self.label));
            match std::mem::take(&mut self.mode) {
                Mode::Normal => Ok(()),
                Mode::Fail => Err(EntityError::failed("probe failure")),
                Mode::Panic => panic!("probe panic"),
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Records the loop counts it is called with.
    #[derive(Default)]
    struct RecordingListener {
        calls: Mutex<Vec<u64>>,
    }

    impl ErrorListener for RecordingListener {
        fn error(&self, _error: &EngineError, loop_count: u64) {
            self.calls.lock().unwrap().push(loop_count);
        }
    }

    fn engine() -> GameEngine {
        GameEngine::new(Arc::new(EntityRegistry::new()))
    }

    fn push(
        log: &Log,
        entry: &'static str,
    ) -> impl FnOnce(&mut GameEngine) -> Result<(), EngineError> + Send + 'static {
        let log = Arc::clone(log);
        move |_| {
            log.lock().unwrap().push(entry.to_string());
            Ok(())
        }
    }

    fn events(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_commands_run_in_order_before_entities() {
        let log = Log::default();
        let mut engine = engine();
        engine.add(Probe::boxed("a", &log, Mode::Normal));

        engine.post("first", push(&log, "first")).unwrap();
        engine.post("second", push(&log, "second")).unwrap();
        engine.post("third", push(&log, "third")).unwrap();
        engine.tick().unwrap();

        assert_eq!(events(&log), vec!["first", "second", "third", "tick a"]);
        assert_eq!(engine.loop_count(), 1);
    }

    #[test]
    fn test_other_thread_mutations_apply_on_tick() {
        let log = Log::default();
        let mut engine = engine();
        let handle = engine.handle();
        assert!(!handle.is_thread_change_needed());

        let remote_log = Arc::clone(&log);
        thread::spawn(move || {
            assert!(handle.is_thread_change_needed());
            handle.add(Probe::boxed("remote", &remote_log, Mode::Normal)).unwrap();
        })
        .join()
        .unwrap();

        assert!(engine.world().is_empty());
        engine.tick().unwrap();
        assert_eq!(engine.world().len(), 1);
        // Added by a command in this tick, so ticked in the same frame.
        assert_eq!(events(&log), vec!["tick remote"]);
    }

    #[test]
    fn test_query_from_other_thread() {
        let mut engine = engine();
        engine.add(Probe::boxed("a", &Log::default(), Mode::Normal));
        let handle = engine.handle();

        let worker = thread::spawn(move || handle.query(|engine| engine.world().len()));
        while !worker.is_finished() {
            engine.tick().unwrap();
            thread::yield_now();
        }
        assert_eq!(worker.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_query_on_engine_thread_is_refused() {
        let engine = engine();
        let err = engine.handle().query(|_| ()).unwrap_err();
        assert!(matches!(err, EngineError::WrongThread("query")));
    }

    #[test]
    fn test_failed_command_keeps_rest_queued() {
        let log = Log::default();
        let mut engine = engine();
        let listener = Arc::new(RecordingListener::default());
        engine.register_error_listener(listener.clone());

        engine.post("ok", push(&log, "ok")).unwrap();
        engine
            .post("broken", |_| Err(EngineError::command("broken", anyhow::anyhow!("nope"))))
            .unwrap();
        engine.post("later", push(&log, "later")).unwrap();

        let err = engine.tick().unwrap_err();
        assert!(matches!(err, EngineError::Command { name: "broken", .. }));
        assert_eq!(events(&log), vec!["ok"]);
        assert_eq!(engine.loop_count(), 0);
        assert_eq!(*listener.calls.lock().unwrap(), vec![0]);

        engine.tick().unwrap();
        assert_eq!(events(&log), vec!["ok", "later"]);
        assert_eq!(engine.loop_count(), 1);
    }

    #[test]
    fn test_entity_failure_aborts_frame() {
        let log = Log::default();
        let mut engine = engine();
        let listener = Arc::new(RecordingListener::default());
        engine.register_error_listener(listener.clone());

        engine.add(Probe::boxed("a", &log, Mode::Normal));
        engine.add(Probe::boxed("b", &log, Mode::Fail));
        engine.add(Probe::boxed("c", &log, Mode::Normal));
        engine.tick().unwrap_err();
        assert_eq!(events(&log), vec!["tick a", "tick b"]);

        engine.tick().unwrap();
        assert_eq!(
            events(&log),
            vec!["tick a", "tick b", "tick a", "tick b", "tick c"]
        );
        assert_eq!(*listener.calls.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_panic_is_reported_not_propagated() {
        let log = Log::default();
        let mut engine = engine();
        let listener = Arc::new(RecordingListener::default());
        engine.register_error_listener(listener.clone());

        engine.add(Probe::boxed("a", &log, Mode::Normal));
        engine.tick().unwrap();
        engine.add(Probe::boxed("boom", &log, Mode::Panic));

        let err = engine.tick().unwrap_err();
        assert!(matches!(err, EngineError::Panicked(message) if message == "probe panic"));
        assert_eq!(*listener.calls.lock().unwrap(), vec![1]);
        // The panicking entity is gone, the rest keeps running.
        assert_eq!(engine.world().len(), 1);
        engine.tick().unwrap();
        assert_eq!(engine.loop_count(), 2);
    }

    #[test]
    fn test_every_listener_hears_each_failure_once() {
        let mut engine = engine();
        let first = Arc::new(RecordingListener::default());
        let second = Arc::new(RecordingListener::default());
        engine.register_error_listener(first.clone());
        engine.register_error_listener(second.clone());

        engine
            .post("broken", |_| Err(EngineError::command("broken", anyhow::anyhow!("nope"))))
            .unwrap();
        engine.tick().unwrap_err();

        assert_eq!(first.calls.lock().unwrap().len(), 1);
        assert_eq!(second.calls.lock().unwrap().len(), 1);

        let second: Arc<dyn ErrorListener> = second;
        assert!(engine.unregister_error_listener(&second));
        assert!(!engine.unregister_error_listener(&second));
    }

    #[test]
    fn test_clear_resets_loop_count() {
        let log = Log::default();
        let mut engine = engine();
        engine.add(Probe::boxed("a", &log, Mode::Normal));
        engine.tick().unwrap();
        engine.tick().unwrap();
        assert_eq!(engine.loop_count(), 2);

        engine.clear();
        assert_eq!(engine.loop_count(), 0);
        assert!(engine.world().is_empty());
    }

    #[test]
    fn test_configuration_swap() {
        let mut engine = engine();
        assert!(engine.configuration().is_none());

        let map = GameMap {
            id: "original".into(),
            width: 10.0,
            height: 8.0,
            plateaus: Vec::new(),
            paths: Vec::new(),
        };
        let config = Arc::new(GameConfiguration::new(Default::default(), map, Vec::new()));
        engine.handle().set_configuration(config).unwrap();
        assert!(engine.configuration().is_none());

        engine.tick().unwrap();
        assert_eq!(engine.configuration().unwrap().map().id, "original");
    }

    #[test]
    fn test_create_entity_uses_registry() {
        let log = Log::default();
        let mut registry = EntityRegistry::new();
        let factory_log = Arc::clone(&log);
        registry.register("probe", move || Probe::boxed("made", &factory_log, Mode::Normal));
        let engine = GameEngine::new(Arc::new(registry));

        assert_eq!(engine.create_entity("probe").unwrap().name(), "probe");
        assert!(engine.create_entity("missing").is_err());
    }

    #[test]
    fn test_loop_count_tracks_successful_ticks() {
        let counter = Arc::new(AtomicU64::new(0));
        let mut engine = engine();
        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            engine
                .post("count", move |engine| {
                    counter.store(engine.loop_count(), Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
            engine.tick().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(engine.loop_count(), 5);
    }
}
