//! Dedicated simulation thread.
//!
//! [`GameLoop::spawn`] starts a thread named `game-loop`, creates the
//! [`GameEngine`] on it (so that thread is the engine's owner) and calls
//! [`GameEngine::tick`] at a fixed rate until stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use engine_entity::{EntityRegistry, TARGET_FRAME_RATE};
use tracing::{debug, info, warn};

use crate::engine::GameEngine;
use crate::error::EngineError;
use crate::handle::EngineHandle;

/// Configuration for the loop thread.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl LoopConfig {
    fn validate(&self) -> Result<(), EngineError> {
        if self.tick_rate.is_finite() && self.tick_rate > 0.0 {
            Ok(())
        } else {
            Err(EngineError::InvalidConfig(format!(
                "tick rate must be a positive number, got {}",
                self.tick_rate
            )))
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_rate: f64::from(TARGET_FRAME_RATE),
            max_ticks: 0,
        }
    }
}

/// A running simulation thread.
///
/// Dropping the loop stops the thread and waits for it to finish.
#[derive(Debug)]
pub struct GameLoop {
    handle: EngineHandle,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl GameLoop {
    /// Start the loop thread.
    ///
    /// `setup` runs on the loop thread right after the engine is created and
    /// before the first tick; use it to register persisters, observers and
    /// error listeners.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the tick rate is not a
    /// positive finite number, [`EngineError::Spawn`] if the thread cannot be
    /// started and [`EngineError::Disconnected`] if it dies during `setup`.
    pub fn spawn<F>(
        config: LoopConfig,
        registry: Arc<EntityRegistry>,
        setup: F,
    ) -> Result<Self, EngineError>
    where
        F: FnOnce(&mut GameEngine) + Send + 'static,
    {
        config.validate()?;
        let running = Arc::new(AtomicBool::new(true));
        let (handle_tx, handle_rx) = mpsc::sync_channel(1);

        let thread_running = Arc::clone(&running);
        let thread = thread::Builder::new()
            .name("game-loop".into())
            .spawn(move || {
                // Declared first so it drops after the engine.
                let stopped = StopOnExit(thread_running);
                let mut engine = GameEngine::new(registry);
                setup(&mut engine);
                if handle_tx.send(engine.handle()).is_err() {
                    return;
                }
                run(&mut engine, &config, &stopped.0);
            })
            .map_err(EngineError::Spawn)?;

        let handle = handle_rx.recv().map_err(|_| EngineError::Disconnected)?;
        Ok(Self {
            handle,
            running,
            thread: Some(thread),
        })
    }

    /// A handle for posting commands to the loop's engine.
    #[must_use]
    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    /// Returns `true` until the loop has been stopped or ran out of ticks.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the loop and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("game loop thread panicked");
            }
            info!("game loop stopped");
        }
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clears the running flag when the loop thread exits, by return or panic.
struct StopOnExit(Arc<AtomicBool>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn run(engine: &mut GameEngine, config: &LoopConfig, running: &AtomicBool) {
    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate);
    let mut tick_count = 0u64;

    info!(
        tick_rate = config.tick_rate,
        max_ticks = config.max_ticks,
        "starting game loop"
    );

    while running.load(Ordering::Acquire) {
        let start = Instant::now();

        // Failures are already logged and handed to the error listeners.
        let _ = engine.tick();

        tick_count += 1;
        if config.max_ticks > 0 && tick_count >= config.max_ticks {
            info!(ticks = tick_count, "game loop complete");
            break;
        }

        let elapsed = start.elapsed();
        if elapsed < tick_duration {
            thread::sleep(tick_duration - elapsed);
        } else {
            warn!(
                loop_count = engine.loop_count(),
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = tick_duration.as_millis() as u64,
                "tick exceeded time budget"
            );
        }
    }

    debug!(ticks = tick_count, entities = engine.world().len(), "leaving game loop");
}
