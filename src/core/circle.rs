//! Fixed-Point Circles
//!
//! Positions and collision shapes for ships, loot and cannonballs.
//! Collision compares squared distances so no square root is ever taken.

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::to_float;

/// Circle with fixed-point center and radius.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Circle {
    /// Center X (scaled by `DECIMAL_SCALE`)
    pub x: u64,
    /// Center Y (scaled by `DECIMAL_SCALE`)
    pub y: u64,
    /// Radius (scaled by `DECIMAL_SCALE`)
    pub r: u64,
}

impl Circle {
    /// Zero circle (origin, no radius).
    pub const ZERO: Self = Self { x: 0, y: 0, r: 0 };

    /// Create a new circle.
    #[inline]
    pub const fn new(x: u64, y: u64, r: u64) -> Self {
        Self { x, y, r }
    }

    /// Squared Euclidean distance between centers.
    #[inline]
    pub fn distance_squared(&self, other: &Circle) -> u128 {
        let dx = self.x.abs_diff(other.x) as u128;
        let dy = self.y.abs_diff(other.y) as u128;
        (dx * dx).saturating_add(dy * dy)
    }

    /// True iff the circles touch or overlap.
    #[inline]
    pub fn collides_with(&self, other: &Circle) -> bool {
        let reach = self.r as u128 + other.r as u128;
        self.distance_squared(other) <= reach.saturating_mul(reach)
    }

    /// Convert to float tuple `(x, y, r)` for rendering.
    #[inline]
    pub fn to_floats(self) -> (f64, f64, f64) {
        (to_float(self.x), to_float(self.y), to_float(self.r))
    }
}

impl fmt::Debug for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, r) = self.to_floats();
        write!(f, "Circle({:.3}, {:.3}; r={:.3})", x, y, r)
    }
}

impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, _) = self.to_floats();
        write!(f, "({:.3}, {:.3})", x, y)
    }
}

// =============================================================================
// TESTS
// =============================================================================
