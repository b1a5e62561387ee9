//! # engine_math
//!
//! Math types for the simulation engine. Re-exports [`glam`] for linear
//! algebra and defines the 2D spatial helpers used by simulation entities.

pub mod transform;

// Re-export glam types for convenience.
pub use glam::Vec2;

pub use transform::{Transform2D, angle_between, polar};
