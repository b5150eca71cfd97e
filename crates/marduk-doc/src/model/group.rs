use serde::{Deserialize, Serialize};

use super::id::WidgetId;
use super::widget::{default_opacity, default_true};

/// A named selection of widgets and nested groups.
///
/// `parent_group_id` exists in the data model, but the reducer only supports
/// root-level groups today; see [`crate::reducer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupModel {
    pub id: WidgetId,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub member_widget_ids: Vec<WidgetId>,
    #[serde(default)]
    pub member_group_ids: Vec<WidgetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<WidgetId>,
}

/// A z-ordered layer. `order` is back-to-front and mirrors the layer's index in
/// [`DocumentModel::layers`](super::DocumentModel::layers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerModel {
    pub id: WidgetId,
    pub name: String,
    pub order: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub member_widget_ids: Vec<WidgetId>,
    #[serde(default)]
    pub member_group_ids: Vec<WidgetId>,
}
