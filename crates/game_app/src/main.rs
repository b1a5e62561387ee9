//! # game_app
//!
//! Runs a game headless on the simulation thread.
//!
//! ## Startup Sequence
//!
//! 1. Read the map index from the data directory.
//! 2. Start the game loop and register the entity persisters on it.
//! 3. Resume the saved game, or start the default map.
//! 4. Simulate for `--ticks` frames, save and exit.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use engine_entity::{EntityCategory, EntityRegistry};
use engine_logic::{EngineError, GameEngine, GameLoop, LoopConfig};
use game_business::{DirectorySource, GameLoader, MapRepository, SaveStore};
use game_entities::{CANON, Enemy, Plateau, register_entities, register_persisters};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Saves written by other versions are ignored on load.
const APP_VERSION: i64 = 1;

#[derive(Parser)]
#[command(name = "game_app", about = "Headless tower-defense simulation")]
struct Args {
    /// Directory holding game_settings.json, waves.json, maps.json and maps/
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory the saved game is written to
    #[arg(short, long, default_value = ".")]
    save_dir: PathBuf,

    /// Ticks per second
    #[arg(short, long, default_value_t = 30.0)]
    tick_rate: f64,

    /// Number of ticks to simulate before saving
    #[arg(long, default_value_t = 300)]
    ticks: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    info!(dir = %args.data_dir.display(), "reading map index");
    let source = DirectorySource::new(&args.data_dir);
    let maps = MapRepository::from_source(&source).context("loading map index")?;
    info!(maps = maps.maps().len(), default = %maps.default_map().map_id, "maps loaded");

    let mut registry = EntityRegistry::new();
    register_entities(&mut registry);

    let config = LoopConfig {
        tick_rate: args.tick_rate,
        max_ticks: 0,
    };
    let mut game_loop = GameLoop::spawn(config, Arc::new(registry), register_persisters)?;
    let handle = game_loop.handle().clone();

    let loader = GameLoader::new(
        handle.clone(),
        source,
        maps,
        SaveStore::new(&args.save_dir),
        APP_VERSION,
    );
    loader.register_error_listener()?;
    loader.load_game()?;
    handle.post("populate", populate)?;

    thread::sleep(Duration::from_secs_f64(args.ticks as f64 / args.tick_rate));

    let (loop_count, entities, enemies) = handle.query(|engine| {
        (
            engine.loop_count(),
            engine.world().len(),
            engine.world().by_category(EntityCategory::Enemy).count(),
        )
    })?;
    info!(loop_count, entities, enemies, "simulation finished");

    loader.save_game()?;
    // Wait for the save to run before stopping the loop.
    handle.query(|_| ())?;
    game_loop.stop();

    info!(map = ?loader.current_map_id(), path = %loader.save_store().path().display(), "done");
    Ok(())
}

/// Put a canon on the first plateau and send the first wave down its
/// paths, unless the game already has towers or enemies.
fn populate(engine: &mut GameEngine) -> Result<(), EngineError> {
    let Some(configuration) = engine.configuration().cloned() else {
        warn!("no game loaded, nothing to populate");
        return Ok(());
    };

    let has_towers = engine.world().by_category(EntityCategory::Tower).next().is_some();
    if !has_towers {
        let plateau = engine
            .world()
            .by_category(EntityCategory::Plateau)
            .map(|(id, plateau)| (id, plateau.position()))
            .next();
        if let Some((plateau, position)) = plateau {
            let mut canon = engine.create_entity(CANON)?;
            canon.set_position(position);
            engine.add(canon);
            if let Some(plateau) = engine.world_mut().get_as_mut::<Plateau>(plateau) {
                plateau.set_occupied(true);
            }
        }
    }

    let has_enemies = engine.world().by_category(EntityCategory::Enemy).next().is_some();
    if !has_enemies
        && let Some(wave) = configuration.waves().first()
    {
        for entry in &wave.enemies {
            let Some(path) = configuration.map().path(entry.path_index) else {
                warn!(enemy = %entry.name, path = entry.path_index, "wave names a missing path");
                continue;
            };
            let mut entity = engine.create_entity(&entry.name)?;
            if let Some(enemy) = entity.as_any_mut().downcast_mut::<Enemy>() {
                enemy.set_path(path.waypoints.clone());
            }
            engine.add(entity);
        }
        info!(enemies = wave.enemies.len(), "first wave sent");
    }
    Ok(())
}
