//! Geometry types used by widget bounds and property values.
//!
//! Canonical canvas space:
//! - Origin top-left
//! - +X right, +Y down

mod rect;
mod vec2;

pub use rect::Rect;
pub use vec2::Vec2;
