//! Queued commands executed on the engine thread.

use std::fmt;

use crate::engine::GameEngine;
use crate::error::EngineError;

/// The work a [`Message`] carries.
pub type Command = Box<dyn FnOnce(&mut GameEngine) -> Result<(), EngineError> + Send>;

/// A named, one-shot command waiting in the engine queue.
pub struct Message {
    name: &'static str,
    command: Command,
}

impl Message {
    pub fn new<F>(name: &'static str, command: F) -> Self
    where
        F: FnOnce(&mut GameEngine) -> Result<(), EngineError> + Send + 'static,
    {
        Self {
            name,
            command: Box::new(command),
        }
    }

    /// Name the command was posted under, used for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the command, consuming it.
    ///
    /// # Errors
    ///
    /// Returns whatever the command returns.
    pub fn execute(self, engine: &mut GameEngine) -> Result<(), EngineError> {
        (self.command)(engine)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message").field("name", &self.name).finish()
    }
}
