use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Image,
    Font,
    ColorPreset,
    File,
}

/// A project asset referenced from widget properties by `ref_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetModel {
    pub id: String,
    pub name: String,
    pub kind: AssetKind,
    pub ref_key: String,
    /// Always relative to the project directory.
    pub relative_path: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
