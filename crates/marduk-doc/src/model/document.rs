use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::asset::AssetModel;
use super::group::{GroupModel, LayerModel};
use super::id::{NodeKind, WidgetId, ROOT_ID};
use super::runtime::{PropertyBindingModel, RuntimeBindingModel, RuntimeParamModel};
use super::widget::WidgetModel;

// ── SchemaVersion ─────────────────────────────────────────────────────────

/// `major.minor.patch`, ordered component by component.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    /// The schema this build writes.
    pub const CURRENT: SchemaVersion = SchemaVersion::new(1, 2, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let mut next = |name: &str| -> Result<u32, String> {
            parts
                .next()
                .ok_or_else(|| format!("schema version {s:?} is missing the {name} component"))?
                .parse::<u32>()
                .map_err(|_| format!("schema version {s:?} has a non-numeric {name} component"))
        };
        let version = SchemaVersion::new(next("major")?, next("minor")?, next("patch")?);
        if parts.next().is_some() {
            return Err(format!("schema version {s:?} has more than three components"));
        }
        Ok(version)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(v: SchemaVersion) -> Self {
        v.to_string()
    }
}

// ── DocumentModel ─────────────────────────────────────────────────────────

/// The complete editable state of one builder project.
///
/// Mutated only through [`crate::reducer::apply`]. The type is `Clone` and
/// `PartialEq` so history layers can snapshot and compare it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentModel {
    #[serde(default)]
    pub schema_version: SchemaVersion,
    /// Root-level widgets, back to front.
    #[serde(default)]
    pub widgets: Vec<WidgetModel>,
    #[serde(default)]
    pub groups: Vec<GroupModel>,
    #[serde(default)]
    pub layers: Vec<LayerModel>,
    #[serde(default)]
    pub assets: Vec<AssetModel>,
    #[serde(default)]
    pub runtime_params: Vec<RuntimeParamModel>,
    #[serde(default)]
    pub property_bindings: Vec<PropertyBindingModel>,
    #[serde(default)]
    pub runtime_bindings: Vec<RuntimeBindingModel>,
}

impl DocumentModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn widget(&self, id: WidgetId) -> Option<&WidgetModel> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut WidgetModel> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    pub fn group(&self, id: WidgetId) -> Option<&GroupModel> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: WidgetId) -> Option<&mut GroupModel> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn layer(&self, id: WidgetId) -> Option<&LayerModel> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: WidgetId) -> Option<&mut LayerModel> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Whether a node of `kind` with `id` exists.
    pub fn contains(&self, kind: NodeKind, id: WidgetId) -> bool {
        match kind {
            NodeKind::Widget => self.widget(id).is_some(),
            NodeKind::Group  => self.group(id).is_some(),
            NodeKind::Layer  => self.layer(id).is_some(),
        }
    }

    /// Whether `id` is taken by any widget, group or layer.
    pub fn contains_id(&self, id: WidgetId) -> bool {
        self.widget(id).is_some() || self.group(id).is_some() || self.layer(id).is_some()
    }

    /// Largest id in use across widgets, groups and layers, or [`ROOT_ID`]
    /// for an empty document.
    pub fn max_id(&self) -> WidgetId {
        self.widgets.iter().map(|w| w.id)
            .chain(self.groups.iter().map(|g| g.id))
            .chain(self.layers.iter().map(|l| l.id))
            .fold(ROOT_ID, WidgetId::max)
    }

    /// Widget ids in canvas order.
    pub fn widget_ids(&self) -> Vec<WidgetId> {
        self.widgets.iter().map(|w| w.id).collect()
    }
}
