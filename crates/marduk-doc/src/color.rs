//! Color values stored in widget property bags.
//!
//! Unlike the renderer's premultiplied colors these are straight-alpha and
//! stored exactly as the user typed them, so exported code can reproduce them.

use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA color, components in `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from sRGB bytes (`0`–`255`), e.g. from a `#rrggbbaa` literal.
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Returns the color as `[r, g, b, a]` bytes, clamping out-of-range channels.
    pub fn to_srgb_u8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// Straight-alpha HSLA color.
///
/// `h` is in degrees (any finite value, wrapped on conversion); `s`, `l`, `a`
/// are in `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hsla {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    pub a: f32,
}

impl Hsla {
    #[inline]
    pub const fn new(h: f32, s: f32, l: f32, a: f32) -> Self {
        Self { h, s, l, a }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.h.is_finite() && self.s.is_finite() && self.l.is_finite() && self.a.is_finite()
    }

    /// Converts to RGBA using the standard HSL hexcone model.
    pub fn to_rgba(self) -> Rgba {
        let h = self.h.rem_euclid(360.0) / 60.0;
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Rgba::new(r + m, g + m, b + m, self.a.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5 && (a.a - b.a).abs() < 1e-5
    }

    #[test]
    fn primary_hues() {
        assert!(close(Hsla::new(0.0, 1.0, 0.5, 1.0).to_rgba(), Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert!(close(Hsla::new(120.0, 1.0, 0.5, 1.0).to_rgba(), Rgba::new(0.0, 1.0, 0.0, 1.0)));
        assert!(close(Hsla::new(240.0, 1.0, 0.5, 0.5).to_rgba(), Rgba::new(0.0, 0.0, 1.0, 0.5)));
    }

    #[test]
    fn hue_wraps() {
        assert!(close(Hsla::new(360.0, 1.0, 0.5, 1.0).to_rgba(), Hsla::new(0.0, 1.0, 0.5, 1.0).to_rgba()));
        assert!(close(Hsla::new(-120.0, 1.0, 0.5, 1.0).to_rgba(), Hsla::new(240.0, 1.0, 0.5, 1.0).to_rgba()));
    }

    #[test]
    fn grey_has_no_saturation() {
        assert!(close(Hsla::new(77.0, 0.0, 0.25, 1.0).to_rgba(), Rgba::new(0.25, 0.25, 0.25, 1.0)));
    }

    #[test]
    fn srgb_bytes_round_trip() {
        assert_eq!(Rgba::from_srgb_u8(255, 128, 0, 255).to_srgb_u8(), [255, 128, 0, 255]);
    }
}
