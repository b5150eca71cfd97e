//! JSON form of a document's runtime data.
//!
//! ```json
//! {
//!   "runtimeParams":    [{ "key": "gain", "type": "number", "defaultValue": 0.5 }],
//!   "propertyBindings": [{ "id": 20, "targetWidgetId": 1, "targetProperty": "value", "expression": "gain" }],
//!   "runtimeBindings":  [{ "id": 30, "sourceWidgetId": 2, "eventKey": "clicked",
//!                          "actions": [{ "kind": "toggleRuntimeParam", "key": "bypass" }] }]
//! }
//! ```

use std::collections::HashSet;

use marduk_doc::model::{
    DocumentModel,
    PropertyBindingModel,
    RuntimeBindingModel,
    RuntimeParamModel,
    RuntimeValue,
    WidgetId,
    ROOT_ID,
};
use marduk_expr::EvalError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("malformed runtime payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate binding id {0}")]
    DuplicateBindingId(WidgetId),

    #[error("binding id {0} is not a valid id")]
    InvalidBindingId(WidgetId),

    #[error("duplicate runtime param key '{0}'")]
    DuplicateParam(String),

    #[error("runtime param '{key}': {reason}")]
    InvalidParam { key: String, reason: String },

    #[error("property binding {id}: {source}")]
    Expression {
        id: WidgetId,
        #[source]
        source: EvalError,
    },
}

/// The runtime collections of a [`DocumentModel`], on their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimePayload {
    #[serde(default)]
    pub runtime_params: Vec<RuntimeParamModel>,
    #[serde(default)]
    pub property_bindings: Vec<PropertyBindingModel>,
    #[serde(default)]
    pub runtime_bindings: Vec<RuntimeBindingModel>,
}

impl RuntimePayload {
    /// Decodes and validates a payload.
    pub fn from_json_str(src: &str) -> Result<Self, PayloadError> {
        let payload: RuntimePayload = serde_json::from_str(src)?;
        payload.validate()?;
        log::debug!(
            "runtime payload: {} param(s), {} property binding(s), {} runtime binding(s)",
            payload.runtime_params.len(),
            payload.property_bindings.len(),
            payload.runtime_bindings.len(),
        );
        Ok(payload)
    }

    pub fn to_json_string(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copies the runtime collections out of `document`.
    pub fn from_document(document: &DocumentModel) -> Self {
        Self {
            runtime_params: document.runtime_params.clone(),
            property_bindings: document.property_bindings.clone(),
            runtime_bindings: document.runtime_bindings.clone(),
        }
    }

    /// Replaces the runtime collections of `document` with this payload.
    pub fn install(self, document: &mut DocumentModel) {
        document.runtime_params = self.runtime_params;
        document.property_bindings = self.property_bindings;
        document.runtime_bindings = self.runtime_bindings;
    }

    /// Checks what the JSON schema alone cannot.
    ///
    /// - binding ids are positive and unique across both binding lists
    /// - param keys are non-blank, unique, and their defaults match the
    ///   declared type
    /// - every property binding expression parses
    pub fn validate(&self) -> Result<(), PayloadError> {
        let mut keys: HashSet<&str> = HashSet::new();
        for p in &self.runtime_params {
            let key = p.key.trim();
            if key.is_empty() {
                return Err(PayloadError::InvalidParam { key: p.key.clone(), reason: "key is blank".into() });
            }
            if !keys.insert(key) {
                return Err(PayloadError::DuplicateParam(key.to_string()));
            }
            if !p.value_type.accepts(&p.default_value) {
                return Err(PayloadError::InvalidParam {
                    key: key.to_string(),
                    reason: format!(
                        "default is a {} value but the declared type is {:?}",
                        p.default_value.type_name(),
                        p.value_type
                    ),
                });
            }
            if matches!(p.default_value, RuntimeValue::Double(v) if !v.is_finite()) {
                return Err(PayloadError::InvalidParam { key: key.to_string(), reason: "default is not finite".into() });
            }
        }

        let ids = self
            .property_bindings
            .iter()
            .map(|b| b.id)
            .chain(self.runtime_bindings.iter().map(|b| b.id));
        let mut seen: HashSet<WidgetId> = HashSet::new();
        for id in ids {
            if id <= ROOT_ID {
                return Err(PayloadError::InvalidBindingId(id));
            }
            if !seen.insert(id) {
                return Err(PayloadError::DuplicateBindingId(id));
            }
        }

        for b in &self.property_bindings {
            marduk_expr::parse(&b.expression).map_err(|source| PayloadError::Expression { id: b.id, source })?;
        }
        Ok(())
    }
}
