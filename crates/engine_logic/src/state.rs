//! Typed key/value snapshot of a running game.
//!
//! A [`GameState`] is what gets written to the save artifact: a flat JSON
//! object whose top-level keys are owned by whoever put them there (the
//! loader stores `appVersion` and `mapId`, persisters store their records).

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StateError;

/// Key/value snapshot serialized as a single JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameState {
    values: BTreeMap<String, Value>,
}

impl GameState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), Value::from(value));
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), Value::String(value.into()));
    }

    /// Store any serializable value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Json`] if `value` cannot be represented as JSON.
    pub fn put_value<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), StateError> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if `key` is absent or not an integer.
    pub fn get_int(&self, key: &str) -> Result<i64, StateError> {
        self.raw(key)?.as_i64().ok_or_else(|| StateError::WrongType {
            key: key.to_string(),
            expected: "an integer",
        })
    }

    /// # Errors
    ///
    /// Fails if `key` is absent or not a string.
    pub fn get_string(&self, key: &str) -> Result<&str, StateError> {
        self.raw(key)?.as_str().ok_or_else(|| StateError::WrongType {
            key: key.to_string(),
            expected: "a string",
        })
    }

    /// Decode the value under `key`.
    ///
    /// # Errors
    ///
    /// Fails if `key` is absent or its value does not decode as `T`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<T, StateError> {
        Ok(T::deserialize(self.raw(key)?)?)
    }

    /// Returns `true` if something is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Write the state as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Json`] on encoding or write failure.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), StateError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Read a state previously written by [`GameState::write_to`].
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Json`] if the input is not a JSON object.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, StateError> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn raw(&self, key: &str) -> Result<&Value, StateError> {
        self.values
            .get(key)
            .ok_or_else(|| StateError::Missing(key.to_string()))
    }
}
