use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{Hsla, Rgba};
use crate::coords::{Rect, Vec2};

/// A value stored in a widget's property bag.
///
/// Serialized untagged so payloads stay readable: `true`, `3`, `0.5`,
/// `"text"`, `{x,y}`, `{x,y,w,h}`, `{r,g,b,a}`, `{h,s,l,a}`. Variant order
/// matters for decoding: rectangles are tried before points because a
/// rectangle object also carries `x` and `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Rect(Rect),
    Point(Vec2),
    Rgba(Rgba),
    Hsla(Hsla),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_)   => "bool",
            PropertyValue::Int(_)    => "int",
            PropertyValue::Double(_) => "double",
            PropertyValue::String(_) => "string",
            PropertyValue::Rect(_)   => "rect",
            PropertyValue::Point(_)  => "point",
            PropertyValue::Rgba(_)   => "rgba",
            PropertyValue::Hsla(_)   => "hsla",
        }
    }

    /// Whether every floating-point component is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            PropertyValue::Bool(_) | PropertyValue::Int(_) | PropertyValue::String(_) => true,
            PropertyValue::Double(v) => v.is_finite(),
            PropertyValue::Rect(r)   => r.is_finite(),
            PropertyValue::Point(p)  => p.is_finite(),
            PropertyValue::Rgba(c)   => c.is_finite(),
            PropertyValue::Hsla(c)   => c.is_finite(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(v)    => Some(*v as f64),
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self { PropertyValue::Bool(v) }
}
impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self { PropertyValue::Int(v) }
}
impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self { PropertyValue::Double(v) }
}
impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self { PropertyValue::String(v.to_string()) }
}
impl From<String> for PropertyValue {
    fn from(v: String) -> Self { PropertyValue::String(v) }
}
impl From<Rgba> for PropertyValue {
    fn from(v: Rgba) -> Self { PropertyValue::Rgba(v) }
}

/// String-keyed widget properties. Key order carries no meaning.
pub type PropertyBag = BTreeMap<String, PropertyValue>;

/// Property key reserved for widget geometry; bounds live on the widget itself.
pub const RESERVED_BOUNDS_KEY: &str = "bounds";
