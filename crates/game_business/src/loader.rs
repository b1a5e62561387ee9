//! Starting, restarting, saving and restoring games.
//!
//! Every public operation of [`GameLoader`] is posted to the engine queue
//! and runs on the simulation thread during the next tick; failures are
//! reported through the engine's error listeners. Code that already owns
//! the engine calls the `*_with` variants, which run immediately and
//! return the error to the caller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use engine_entity::Entity;
use engine_logic::{
    EngineError, EngineHandle, ErrorListener, GameConfiguration, GameEngine, GameState,
    StateError,
};
use tracing::{info, warn};

use crate::error::LoaderError;
use crate::map_repository::{MapInfo, MapRepository};
use crate::save::SaveStore;
use crate::source::{ConfigurationSource, build_configuration};

/// State key holding the version of the application that wrote a save.
pub const APP_VERSION_KEY: &str = "appVersion";
/// State key holding the id of the saved map.
pub const MAP_ID_KEY: &str = "mapId";
/// Errors within this many ticks of a load are treated as a crash loop.
pub const CRASH_LOOP_THRESHOLD: u64 = 10;

/// Notified after a map or a saved game has been applied to the engine.
pub trait LoaderListener: Send + Sync {
    fn game_loaded(&self, map_id: &str);
}

struct Inner {
    engine: EngineHandle,
    source: Box<dyn ConfigurationSource>,
    maps: MapRepository,
    saves: SaveStore,
    app_version: i64,
    current_map_id: Mutex<Option<String>>,
    listeners: Mutex<Vec<Arc<dyn LoaderListener>>>,
}

/// Builds game configurations and moves games in and out of the save store.
#[derive(Clone)]
pub struct GameLoader {
    inner: Arc<Inner>,
}

impl GameLoader {
    pub fn new(
        engine: EngineHandle,
        source: impl ConfigurationSource + 'static,
        maps: MapRepository,
        saves: SaveStore,
        app_version: i64,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                source: Box::new(source),
                maps,
                saves,
                app_version,
                current_map_id: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn map_repository(&self) -> &MapRepository {
        &self.inner.maps
    }

    #[must_use]
    pub fn save_store(&self) -> &SaveStore {
        &self.inner.saves
    }

    #[must_use]
    pub fn app_version(&self) -> i64 {
        self.inner.app_version
    }

    /// Id of the map currently installed in the engine.
    #[must_use]
    pub fn current_map_id(&self) -> Option<String> {
        lock(&self.inner.current_map_id).clone()
    }

    pub fn add_listener(&self, listener: Arc<dyn LoaderListener>) {
        lock(&self.inner.listeners).push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn LoaderListener>) -> bool {
        let mut listeners = lock(&self.inner.listeners);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    /// Queue registration of this loader as an engine error listener.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine is gone.
    pub fn register_error_listener(&self) -> Result<(), EngineError> {
        let loader = self.clone();
        self.inner.engine.post("register_loader", move |engine| {
            engine.register_error_listener(Arc::new(loader));
            Ok(())
        })
    }

    /// Queue [`GameLoader::restart_with`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine is gone.
    pub fn restart(&self) -> Result<(), EngineError> {
        self.marshal("restart", |loader, engine| loader.restart_with(engine))
    }

    /// Queue [`GameLoader::load_map_with`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine is gone.
    pub fn load_map(&self, map: MapInfo) -> Result<(), EngineError> {
        self.marshal("load_map", move |loader, engine| {
            loader.load_map_with(engine, &map)
        })
    }

    /// Queue [`GameLoader::save_game_with`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine is gone.
    pub fn save_game(&self) -> Result<(), EngineError> {
        self.marshal("save_game", |loader, engine| loader.save_game_with(engine))
    }

    /// Queue [`GameLoader::load_game_with`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine is gone.
    pub fn load_game(&self) -> Result<(), EngineError> {
        self.marshal("load_game", |loader, engine| loader.load_game_with(engine))
    }

    fn marshal<F>(&self, name: &'static str, op: F) -> Result<(), EngineError>
    where
        F: FnOnce(&GameLoader, &mut GameEngine) -> Result<(), LoaderError> + Send + 'static,
    {
        let loader = self.clone();
        self.inner.engine.post(name, move |engine| {
            op(&loader, engine).map_err(|err| EngineError::command(name, err))
        })
    }

    /// Reload the current map from scratch. Does nothing if no map is loaded.
    ///
    /// # Errors
    ///
    /// See [`GameLoader::load_map_with`].
    pub fn restart_with(&self, engine: &mut GameEngine) -> Result<(), LoaderError> {
        let Some(map_id) = self.current_map_id() else {
            info!("nothing to restart");
            return Ok(());
        };
        let map = self
            .inner
            .maps
            .get_by_id(&map_id)
            .cloned()
            .ok_or(LoaderError::UnknownMap(map_id))?;
        self.load_map_with(engine, &map)
    }

    /// Start a fresh game on `map`.
    ///
    /// The configuration and the plateau entities are built before the
    /// engine is touched, so a failure leaves the running game as it was.
    ///
    /// # Errors
    ///
    /// Fails if a configuration document is missing or invalid, or a
    /// plateau names an unregistered entity type.
    pub fn load_map_with(&self, engine: &mut GameEngine, map: &MapInfo) -> Result<(), LoaderError> {
        info!(map = %map.map_id, "loading map");
        let configuration = build_configuration(self.inner.source.as_ref(), map)?;
        let plateaus = configuration
            .map()
            .plateaus
            .iter()
            .map(|plateau| {
                let mut entity = engine.create_entity(&plateau.name)?;
                entity.set_position(plateau.position);
                Ok(entity)
            })
            .collect::<Result<Vec<Box<dyn Entity>>, LoaderError>>()?;

        self.install(engine, configuration);
        engine.reset_state();
        for plateau in plateaus {
            engine.add(plateau);
        }
        self.notify_loaded(&map.map_id);
        Ok(())
    }

    /// Write the running game to the save store.
    ///
    /// # Errors
    ///
    /// [`LoaderError::NoMapLoaded`] if there is no game, otherwise
    /// [`LoaderError::Save`] when a persister or the file write fails.
    pub fn save_game_with(&self, engine: &GameEngine) -> Result<(), LoaderError> {
        let map_id = self.current_map_id().ok_or(LoaderError::NoMapLoaded)?;
        let mut state = GameState::new();
        state.put_int(APP_VERSION_KEY, self.inner.app_version);
        state.put_string(MAP_ID_KEY, map_id.as_str());
        engine.write_state(&mut state).map_err(LoaderError::Save)?;
        self.inner.saves.write(&state)?;
        info!(map = %map_id, entities = engine.world().len(), "game saved");
        Ok(())
    }

    /// Resume the saved game, or start the default map when there is no
    /// usable save.
    ///
    /// A save written by another application version, naming a map that no
    /// longer exists, or missing the records of a persister is ignored.
    /// Everything is decoded before the engine is touched, so a failure
    /// leaves the running game as it was.
    ///
    /// # Errors
    ///
    /// Fails if the save exists but is unreadable, its configuration cannot
    /// be built, or its records name entities that cannot be restored.
    pub fn load_game_with(&self, engine: &mut GameEngine) -> Result<(), LoaderError> {
        let Some(state) = self.inner.saves.read()? else {
            info!("no saved game");
            return self.load_default_map(engine);
        };
        let Some(map) = self.saved_map(&state) else {
            return self.load_default_map(engine);
        };

        let configuration = build_configuration(self.inner.source.as_ref(), &map)?;
        let pending = match engine.decode_state(&state) {
            Ok(pending) => pending,
            Err(err @ (StateError::Missing(_) | StateError::WrongType { .. })) => {
                info!(error = %err, "ignoring incomplete saved game");
                return self.load_default_map(engine);
            }
            Err(err) => return Err(LoaderError::Restore(err)),
        };

        info!(map = %map.map_id, "restoring saved game");
        self.install(engine, configuration);
        engine.apply_state(pending);
        self.notify_loaded(&map.map_id);
        Ok(())
    }

    fn load_default_map(&self, engine: &mut GameEngine) -> Result<(), LoaderError> {
        let map = self.inner.maps.default_map().clone();
        self.load_map_with(engine, &map)
    }

    fn saved_map(&self, state: &GameState) -> Option<MapInfo> {
        let version = match state.get_int(APP_VERSION_KEY) {
            Ok(version) => version,
            Err(err) => {
                info!(error = %err, "ignoring saved game");
                return None;
            }
        };
        if version != self.inner.app_version {
            info!(
                saved = version,
                current = self.inner.app_version,
                "ignoring saved game from another version"
            );
            return None;
        }
        let map_id = match state.get_string(MAP_ID_KEY) {
            Ok(map_id) => map_id,
            Err(err) => {
                info!(error = %err, "ignoring saved game");
                return None;
            }
        };
        let map = self.inner.maps.get_by_id(map_id).cloned();
        if map.is_none() {
            info!(map = map_id, "ignoring saved game for unknown map");
        }
        map
    }

    fn install(&self, engine: &mut GameEngine, configuration: GameConfiguration) {
        engine.clear();
        *lock(&self.inner.current_map_id) = Some(configuration.map().id.clone());
        engine.set_configuration(Arc::new(configuration));
    }

    fn notify_loaded(&self, map_id: &str) {
        let listeners = lock(&self.inner.listeners).clone();
        for listener in listeners {
            listener.game_loaded(map_id);
        }
    }
}

impl ErrorListener for GameLoader {
    fn error(&self, error: &EngineError, loop_count: u64) {
        if loop_count < CRASH_LOOP_THRESHOLD {
            warn!(
                loop_count,
                error = %error,
                "engine failed right after loading, deleting saved game"
            );
            self.inner.saves.delete();
        }
    }
}

impl std::fmt::Debug for GameLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoader")
            .field("app_version", &self.inner.app_version)
            .field("current_map_id", &self.current_map_id())
            .field("saves", &self.inner.saves)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
