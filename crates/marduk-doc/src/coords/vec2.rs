use serde::{Deserialize, Serialize};

/// A point or a size in canvas units, serialized as `{ "x", "y" }`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Finite with both components `>= 0`; the rule for sizes.
    #[inline]
    pub fn is_valid_size(self) -> bool {
        self.is_finite() && self.x >= 0.0 && self.y >= 0.0
    }
}
