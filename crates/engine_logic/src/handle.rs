//! Cross-thread access to a [`GameEngine`].
//!
//! The engine itself is owned by one thread. Every other thread talks to it
//! through an [`EngineHandle`], which can only enqueue commands; they run at
//! the start of the engine's next tick, in the order they were posted.

use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, ThreadId};

use engine_entity::{Entity, EntityId};
use tracing::trace;

use crate::config::GameConfiguration;
use crate::engine::GameEngine;
use crate::error::EngineError;
use crate::message::Message;

/// Clonable, thread-safe sender of engine commands.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: Sender<Message>,
    owner: ThreadId,
}

impl EngineHandle {
    pub(crate) fn new(sender: Sender<Message>, owner: ThreadId) -> Self {
        Self { sender, owner }
    }

    /// Returns `true` when called from any thread other than the one that
    /// owns the engine.
    #[must_use]
    pub fn is_thread_change_needed(&self) -> bool {
        thread::current().id() != self.owner
    }

    /// Enqueue `command` for the next tick. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine has been dropped.
    pub fn post<F>(&self, name: &'static str, command: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut GameEngine) -> Result<(), EngineError> + Send + 'static,
    {
        trace!(command = name, "posting command");
        self.sender
            .send(Message::new(name, command))
            .map_err(|_| EngineError::Disconnected)
    }

    /// Run `query` on the engine thread and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WrongThread`] when called from the engine's own
    /// thread (it would wait forever) and [`EngineError::Disconnected`] if the
    /// engine goes away before answering.
    pub fn query<T, F>(&self, query: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&mut GameEngine) -> T + Send + 'static,
    {
        if !self.is_thread_change_needed() {
            return Err(EngineError::WrongThread("query"));
        }
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.post("query", move |engine| {
            // The caller may have given up waiting.
            let _ = reply_tx.send(query(engine));
            Ok(())
        })?;
        reply_rx.recv().map_err(|_| EngineError::Disconnected)
    }

    /// Queue `entity` for insertion.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine has been dropped.
    pub fn add(&self, entity: Box<dyn Entity>) -> Result<(), EngineError> {
        self.post("add", move |engine| {
            engine.add(entity);
            Ok(())
        })
    }

    /// Queue removal of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine has been dropped.
    pub fn remove(&self, id: EntityId) -> Result<(), EngineError> {
        self.post("remove", move |engine| {
            engine.remove(id);
            Ok(())
        })
    }

    /// Queue removal of every entity.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine has been dropped.
    pub fn clear(&self) -> Result<(), EngineError> {
        self.post("clear", |engine| {
            engine.clear();
            Ok(())
        })
    }

    /// Queue a configuration swap.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disconnected`] if the engine has been dropped.
    pub fn set_configuration(
        &self,
        configuration: Arc<GameConfiguration>,
    ) -> Result<(), EngineError> {
        self.post("set_configuration", move |engine| {
            engine.set_configuration(configuration);
            Ok(())
        })
    }
}
