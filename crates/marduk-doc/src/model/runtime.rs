use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::Rect;

use super::id::{NodeRef, WidgetId};
use super::value::PropertyBag;
use super::widget::default_true;

// ── RuntimeValue ──────────────────────────────────────────────────────────

/// A live runtime-parameter value.
///
/// Serialized untagged: `true`, `3`, `0.5`, `"text"`. Integral JSON numbers
/// decode as `Int`, everything else numeric as `Double`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuntimeValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl RuntimeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Bool(_)   => "bool",
            RuntimeValue::Int(_)    => "int",
            RuntimeValue::Double(_) => "double",
            RuntimeValue::String(_) => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, RuntimeValue::Int(_) | RuntimeValue::Double(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RuntimeValue::Int(v)    => Some(*v as f64),
            RuntimeValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Truthiness used by `toggle`: bools as-is, numbers are true when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RuntimeValue::Bool(v)   => Some(*v),
            RuntimeValue::Int(v)    => Some(*v != 0),
            RuntimeValue::Double(v) => Some(*v != 0.0),
            RuntimeValue::String(_) => None,
        }
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Bool(v)   => write!(f, "{v}"),
            RuntimeValue::Int(v)    => write!(f, "{v}"),
            RuntimeValue::Double(v) => write!(f, "{v}"),
            RuntimeValue::String(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for RuntimeValue {
    fn from(v: bool) -> Self { RuntimeValue::Bool(v) }
}
impl From<i64> for RuntimeValue {
    fn from(v: i64) -> Self { RuntimeValue::Int(v) }
}
impl From<f64> for RuntimeValue {
    fn from(v: f64) -> Self { RuntimeValue::Double(v) }
}
impl From<&str> for RuntimeValue {
    fn from(v: &str) -> Self { RuntimeValue::String(v.to_string()) }
}

// ── Declarations ──────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuntimeParamType {
    Number,
    Boolean,
    String,
}

impl RuntimeParamType {
    /// Whether `value` is an acceptable value for a parameter of this type.
    pub fn accepts(self, value: &RuntimeValue) -> bool {
        match self {
            RuntimeParamType::Number  => value.is_numeric(),
            RuntimeParamType::Boolean => matches!(value, RuntimeValue::Bool(_)),
            RuntimeParamType::String  => matches!(value, RuntimeValue::String(_)),
        }
    }
}

/// A declared runtime parameter with its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeParamModel {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: RuntimeParamType,
    pub default_value: RuntimeValue,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exposed: bool,
}

/// Computes one widget property from an arithmetic expression over runtime
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyBindingModel {
    pub id: WidgetId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub target_widget_id: WidgetId,
    pub target_property: String,
    pub expression: String,
}

/// Maps one widget event to an ordered list of runtime actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeBindingModel {
    pub id: WidgetId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub source_widget_id: WidgetId,
    pub event_key: String,
    #[serde(default)]
    pub actions: Vec<RuntimeActionModel>,
}

// ── RuntimeActionModel ────────────────────────────────────────────────────

/// One step executed when a runtime binding fires.
///
/// Decoded from `{ "kind": "...", ... }`; a kind this build does not know
/// decodes to [`RuntimeActionModel::Unknown`] and is skipped at run time
/// instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RuntimeActionModel {
    SetRuntimeParam {
        #[serde(alias = "paramKey")]
        key: String,
        /// When absent, the event payload is stored instead.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<RuntimeValue>,
    },
    AdjustRuntimeParam {
        #[serde(alias = "paramKey")]
        key: String,
        delta: f64,
    },
    ToggleRuntimeParam {
        #[serde(alias = "paramKey")]
        key: String,
    },
    SetNodeProps {
        target: NodeRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locked: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f32>,
        #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
        patch: PropertyBag,
    },
    SetNodeBounds {
        target_widget_id: WidgetId,
        bounds: Rect,
    },
    #[serde(other)]
    Unknown,
}

impl RuntimeActionModel {
    pub fn kind_name(&self) -> &'static str {
        match self {
            RuntimeActionModel::SetRuntimeParam { .. }    => "setRuntimeParam",
            RuntimeActionModel::AdjustRuntimeParam { .. } => "adjustRuntimeParam",
            RuntimeActionModel::ToggleRuntimeParam { .. } => "toggleRuntimeParam",
            RuntimeActionModel::SetNodeProps { .. }       => "setNodeProps",
            RuntimeActionModel::SetNodeBounds { .. }      => "setNodeBounds",
            RuntimeActionModel::Unknown                   => "unknown",
        }
    }

    /// Actions that touch widget state and therefore must run on the UI thread.
    pub fn is_ui_affecting(&self) -> bool {
        matches!(
            self,
            RuntimeActionModel::SetNodeProps { .. } | RuntimeActionModel::SetNodeBounds { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::NodeKind;

    #[test]
    fn decodes_param_actions() {
        let a: RuntimeActionModel =
            serde_json::from_value(json!({ "kind": "adjustRuntimeParam", "key": "gain", "delta": -0.5 })).unwrap();
        assert_eq!(a, RuntimeActionModel::AdjustRuntimeParam { key: "gain".into(), delta: -0.5 });

        let s: RuntimeActionModel =
            serde_json::from_value(json!({ "kind": "setRuntimeParam", "paramKey": "mode" })).unwrap();
        assert_eq!(s, RuntimeActionModel::SetRuntimeParam { key: "mode".into(), value: None });
    }

    #[test]
    fn decodes_node_actions() {
        let a: RuntimeActionModel = serde_json::from_value(json!({
            "kind": "setNodeProps",
            "target": { "kind": "widget", "id": 4 },
            "visible": false,
            "patch": { "text": "armed" }
        }))
        .unwrap();
        match a {
            RuntimeActionModel::SetNodeProps { target, visible, patch, .. } => {
                assert_eq!(target.kind, NodeKind::Widget);
                assert_eq!(target.id, 4);
                assert_eq!(visible, Some(false));
                assert_eq!(patch.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }

        let b: RuntimeActionModel = serde_json::from_value(json!({
            "kind": "setNodeBounds",
            "targetWidgetId": 2,
            "bounds": { "x": 0, "y": 0, "w": 10, "h": 5 }
        }))
        .unwrap();
        assert_eq!(b.kind_name(), "setNodeBounds");
    }

    #[test]
    fn unknown_kind_is_tolerated() {
        let a: RuntimeActionModel = serde_json::from_value(json!({ "kind": "playSound" })).unwrap();
        assert_eq!(a, RuntimeActionModel::Unknown);
    }

    #[test]
    fn param_type_acceptance() {
        assert!(RuntimeParamType::Number.accepts(&RuntimeValue::Int(1)));
        assert!(RuntimeParamType::Number.accepts(&RuntimeValue::Double(1.5)));
        assert!(!RuntimeParamType::Number.accepts(&RuntimeValue::Bool(true)));
        assert!(RuntimeParamType::Boolean.accepts(&RuntimeValue::Bool(false)));
        assert!(!RuntimeParamType::String.accepts(&RuntimeValue::Int(0)));
    }
}
