use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier shared by widgets, groups and layers.
///
/// Ids are unique across the whole document, not per collection.
pub type WidgetId = i64;

/// The root sentinel. Never the id of a real entity; every real id is `> ROOT_ID`.
pub const ROOT_ID: WidgetId = 0;

/// Which collection a [`NodeRef`] points into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Widget,
    Group,
    Layer,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Widget => "widget",
            NodeKind::Group  => "group",
            NodeKind::Layer  => "layer",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to a widget, group or layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub id: WidgetId,
}

impl NodeRef {
    #[inline]
    pub const fn widget(id: WidgetId) -> Self {
        Self { kind: NodeKind::Widget, id }
    }

    #[inline]
    pub const fn group(id: WidgetId) -> Self {
        Self { kind: NodeKind::Group, id }
    }

    #[inline]
    pub const fn layer(id: WidgetId) -> Self {
        Self { kind: NodeKind::Layer, id }
    }
}
