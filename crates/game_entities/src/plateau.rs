//! Buildable plots placed by the map.

use std::any::Any;

use engine_entity::{Entity, EntityCategory, EntityError};
use engine_math::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Factory name of the basic plateau.
pub const PLATEAU: &str = "plateau";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct PlateauState {
    occupied: bool,
}

/// A static plot a tower can be built on.
#[derive(Debug, Clone, Default)]
pub struct Plateau {
    position: Vec2,
    state: PlateauState,
}

impl Plateau {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.state.occupied
    }

    pub fn set_occupied(&mut self, occupied: bool) {
        self.state.occupied = occupied;
    }
}

impl Entity for Plateau {
    fn name(&self) -> &'static str {
        PLATEAU
    }

    fn category(&self) -> EntityCategory {
        EntityCategory::Plateau
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn write_state(&self) -> Value {
        serde_json::to_value(self.state).unwrap_or(Value::Null)
    }

    fn read_state(&mut self, state: &Value) -> Result<(), EntityError> {
        self.state = PlateauState::deserialize(state).map_err(|source| EntityError::State {
            name: PLATEAU,
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
