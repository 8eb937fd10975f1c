//! Map geometry: continuous 2D positions and rectangular map bounds.

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Distances below this are treated as zero when normalizing directions.
pub const DIRECTION_EPSILON: f32 = 0.0001;

/// Axis-aligned extent of a map, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    /// Width in world units
    pub width: f32,
    /// Height in world units
    pub height: f32,
}

impl MapBounds {
    /// Creates new bounds. Negative extents collapse to zero.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Returns true if the position lies inside (edges inclusive).
    #[must_use]
    pub fn contains(&self, position: Vec2) -> bool {
        (0.0..=self.width).contains(&position.x) && (0.0..=self.height).contains(&position.y)
    }

    /// Clamps a position into the bounds.
    #[must_use]
    pub fn clamp(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x.clamp(0.0, self.width),
            position.y.clamp(0.0, self.height),
        )
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Returns the unit vector from `from` toward `to`, or `None` when the two
/// points coincide.
#[must_use]
pub fn direction_between(from: Vec2, to: Vec2) -> Option<Vec2> {
    let delta = to - from;
    let length = delta.length();
    if length < DIRECTION_EPSILON {
        None
    } else {
        Some(delta / length)
    }
}
