use serde::{Deserialize, Serialize};

use super::Vec2;

/// Axis-aligned widget bounds in canvas units (top-left origin).
///
/// Serialized flat as `{ "x", "y", "w", "h" }`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RectRepr", into = "RectRepr")]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

#[derive(Serialize, Deserialize)]
struct RectRepr {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl From<RectRepr> for Rect {
    fn from(r: RectRepr) -> Self {
        Rect::new(r.x, r.y, r.w, r.h)
    }
}

impl From<Rect> for RectRepr {
    fn from(r: Rect) -> Self {
        RectRepr { x: r.origin.x, y: r.origin.y, w: r.size.x, h: r.size.y }
    }
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn x(self) -> f32 { self.origin.x }
    #[inline]
    pub fn y(self) -> f32 { self.origin.y }
    #[inline]
    pub fn width(self) -> f32 { self.size.x }
    #[inline]
    pub fn height(self) -> f32 { self.size.y }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Finite coordinates with non-negative width and height.
    ///
    /// This is the only shape a widget's bounds may take in a document.
    #[inline]
    pub fn is_valid_bounds(self) -> bool {
        self.origin.is_finite() && self.size.is_valid_size()
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.origin.x
            && p.y >= self.origin.y
            && p.x < (self.origin.x + self.size.x)
            && p.y < (self.origin.y + self.size.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── is_valid_bounds ───────────────────────────────────────────────────

    #[test]
    fn zero_size_is_valid() {
        assert!(r(0.0, 0.0, 0.0, 0.0).is_valid_bounds());
    }

    #[test]
    fn negative_size_is_invalid() {
        assert!(!r(0.0, 0.0, -1.0, 5.0).is_valid_bounds());
        assert!(!r(0.0, 0.0, 5.0, -1.0).is_valid_bounds());
    }

    #[test]
    fn non_finite_is_invalid() {
        assert!(!r(f32::NAN, 0.0, 1.0, 1.0).is_valid_bounds());
        assert!(!r(0.0, 0.0, f32::INFINITY, 1.0).is_valid_bounds());
    }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_top_left_inclusive() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn contains_bottom_right_exclusive() {
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(10.0, 10.0)));
    }

    // ── serde ─────────────────────────────────────────────────────────────

    #[test]
    fn serializes_flat() {
        let json = serde_json::to_value(r(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "x": 1.0, "y": 2.0, "w": 3.0, "h": 4.0 }));
    }
}
