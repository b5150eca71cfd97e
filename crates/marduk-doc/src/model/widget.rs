use serde::{Deserialize, Serialize};

use crate::coords::Rect;

use super::id::WidgetId;
use super::value::PropertyBag;

/// Widget kinds the builder can place on the canvas.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetType {
    Button,
    Slider,
    Knob,
    Label,
    Meter,
    Toggle,
    ComboBox,
    TextInput,
}

impl WidgetType {
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetType::Button    => "button",
            WidgetType::Slider    => "slider",
            WidgetType::Knob      => "knob",
            WidgetType::Label     => "label",
            WidgetType::Meter     => "meter",
            WidgetType::Toggle    => "toggle",
            WidgetType::ComboBox  => "comboBox",
            WidgetType::TextInput => "textInput",
        }
    }
}

/// One widget on the canvas.
///
/// Widgets are always root-level; their position in
/// [`DocumentModel::widgets`](super::DocumentModel::widgets) is the z-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetModel {
    pub id: WidgetId,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub bounds: Rect,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub properties: PropertyBag,
}

impl WidgetModel {
    pub fn new(id: WidgetId, widget_type: WidgetType, bounds: Rect) -> Self {
        Self {
            id,
            widget_type,
            bounds,
            visible: true,
            locked: false,
            opacity: 1.0,
            properties: PropertyBag::new(),
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_opacity() -> f32 {
    1.0
}
