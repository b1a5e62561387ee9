//! 2D transform used by every positioned entity.
//!
//! Angles are expressed in degrees, counter-clockwise from the positive x
//! axis, matching how towers and shots describe their heading.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position and heading of an entity on the game plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform2D {
    /// World-space position in tile units.
    pub position: Vec2,
    /// Heading in degrees.
    pub angle: f32,
}

impl Transform2D {
    /// The origin, facing along the positive x axis.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        angle: 0.0,
    };

    /// Create a transform at the given position with a zero heading.
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Translate the transform by the given offset.
    #[must_use]
    pub fn translated(mut self, offset: Vec2) -> Self {
        self.position += offset;
        self
    }

    /// Distance between this transform's position and `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Heading in degrees that would point this transform at `point`.
    #[must_use]
    pub fn angle_to(&self, point: Vec2) -> f32 {
        angle_between(self.position, point)
    }

    /// Move towards `point` by at most `step`, never overshooting it.
    ///
    /// Returns `true` once the position coincides with `point`.
    pub fn step_towards(&mut self, point: Vec2, step: f32) -> bool {
        let delta = point - self.position;
        let distance = delta.length();
        if distance <= step {
            self.position = point;
            return true;
        }
        self.position += delta / distance * step;
        false
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Heading in degrees of the vector pointing from `from` to `to`.
#[must_use]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x).to_degrees()
}

/// Vector of the given length pointing along `angle` degrees.
#[must_use]
pub fn polar(length: f32, angle: f32) -> Vec2 {
    Vec2::from_angle(angle.to_radians()) * length
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let t = Transform2D::IDENTITY;
        assert_eq!(t.position, Vec2::ZERO);
        assert_eq!(t.angle, 0.0);
    }

    #[test]
    fn test_translated() {
        let t = Transform2D::IDENTITY.translated(Vec2::new(5.0, 0.0));
        assert_eq!(t.position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_distance_and_angle() {
        let t = Transform2D::from_position(Vec2::new(1.0, 1.0));
        assert!((t.distance_to(Vec2::new(4.0, 5.0)) - 5.0).abs() < 1e-6);
        assert!((t.angle_to(Vec2::new(1.0, 3.0)) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_step_towards_does_not_overshoot() {
        let mut t = Transform2D::IDENTITY;
        assert!(!t.step_towards(Vec2::new(1.0, 0.0), 0.4));
        assert!((t.position.x - 0.4).abs() < 1e-6);
        assert!(t.step_towards(Vec2::new(1.0, 0.0), 5.0));
        assert_eq!(t.position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_polar() {
        let v = polar(2.0, 90.0);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let t = Transform2D {
            position: Vec2::new(1.0, 2.0),
            angle: 45.0,
        };
        let json = serde_json::to_string(&t).unwrap();
        let restored: Transform2D = serde_json::from_str(&json).unwrap();
        assert_eq!(t, restored);
    }
}
