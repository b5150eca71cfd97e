//! Live runtime parameter store.
//!
//! The bridge is the only state the runtime actions touch besides the
//! document. Every successful change bumps a revision counter so callers can
//! tell cheaply whether property bindings need re-evaluation.

use std::collections::BTreeMap;
use std::fmt;

use marduk_doc::model::{RuntimeParamModel, RuntimeValue};
use marduk_expr::{Operand, Resolve};
use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParamErrorKind {
    InvalidKey,
    UnsupportedType,
    NonFiniteNumber,
    TypeMismatch,
}

impl fmt::Display for ParamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamErrorKind::InvalidKey      => "invalid key",
            ParamErrorKind::UnsupportedType => "unsupported type",
            ParamErrorKind::NonFiniteNumber => "non-finite number",
            ParamErrorKind::TypeMismatch    => "type mismatch",
        })
    }
}

/// A rejected bridge operation. The bridge is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ParamError {
    pub kind: ParamErrorKind,
    pub message: String,
}

impl ParamError {
    fn new(kind: ParamErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

type Result<T> = std::result::Result<T, ParamError>;

// ── RuntimeParamBridge ────────────────────────────────────────────────────

/// Typed key/value store backing runtime parameters.
///
/// Keys are trimmed before use. Entries are created on first write and only
/// removed by [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct RuntimeParamBridge {
    values: BTreeMap<String, RuntimeValue>,
    revision: u64,
}

impl Default for RuntimeParamBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeParamBridge {
    pub fn new() -> Self {
        Self { values: BTreeMap::new(), revision: 1 }
    }

    /// Monotonic change counter. Starts at 1.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, key: &str) -> Option<&RuntimeValue> {
        self.values.get(key.trim())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuntimeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Owned copy of every entry.
    pub fn snapshot(&self) -> BTreeMap<String, RuntimeValue> {
        self.values.clone()
    }

    /// Stores `requested`, or `payload` when no value was requested.
    ///
    /// Returns whether the stored value changed.
    pub fn set(
        &mut self,
        key: &str,
        requested: Option<&RuntimeValue>,
        payload: Option<&RuntimeValue>,
    ) -> Result<bool> {
        let key = checked_key(key)?;
        let value = requested.or(payload).ok_or_else(|| {
            ParamError::new(
                ParamErrorKind::UnsupportedType,
                format!("no value or event payload to store in '{key}'"),
            )
        })?;
        check_finite(key, value)?;
        Ok(self.store(key, value.clone()))
    }

    /// Adds `delta` to a numeric parameter. A missing parameter counts as 0.
    ///
    /// Integers stay integers while `delta` is integral and the sum fits in
    /// `i64`; anything else produces a double.
    pub fn adjust(&mut self, key: &str, delta: f64) -> Result<bool> {
        let key = checked_key(key)?;
        if !delta.is_finite() {
            return Err(ParamError::new(
                ParamErrorKind::NonFiniteNumber,
                format!("adjust delta for '{key}' must be finite"),
            ));
        }

        let next = match self.values.get(key) {
            None => add_to_int(0, delta),
            Some(RuntimeValue::Int(v)) => add_to_int(*v, delta),
            Some(RuntimeValue::Double(v)) => RuntimeValue::Double(v + delta),
            Some(other) => {
                return Err(ParamError::new(
                    ParamErrorKind::TypeMismatch,
                    format!("cannot adjust '{key}': it holds a {} value", other.type_name()),
                ));
            }
        };
        check_finite(key, &next)?;
        Ok(self.store(key, next))
    }

    /// Flips a parameter as a bool. A missing parameter becomes `true`;
    /// numbers are coerced (non-zero is `true`) before flipping.
    pub fn toggle(&mut self, key: &str) -> Result<bool> {
        let key = checked_key(key)?;
        let next = match self.values.get(key) {
            None => true,
            Some(current) => match current.as_bool() {
                Some(b) => !b,
                None => {
                    return Err(ParamError::new(
                        ParamErrorKind::TypeMismatch,
                        format!("cannot toggle '{key}': it holds a {} value", current.type_name()),
                    ));
                }
            },
        };
        Ok(self.store(key, RuntimeValue::Bool(next)))
    }

    /// Removes every entry. Always counts as one change.
    pub fn clear(&mut self) {
        self.values.clear();
        self.revision += 1;
        log::trace!("runtime params cleared (revision {})", self.revision);
    }

    /// Stores each declared default.
    ///
    /// All declarations are checked before anything is written, so a bad
    /// declaration leaves the bridge as it was.
    pub fn seed_defaults(&mut self, params: &[RuntimeParamModel]) -> Result<usize> {
        for p in params {
            let key = checked_key(&p.key)?;
            if !p.value_type.accepts(&p.default_value) {
                return Err(ParamError::new(
                    ParamErrorKind::TypeMismatch,
                    format!(
                        "default for '{key}' is a {} value but the parameter is declared {:?}",
                        p.default_value.type_name(),
                        p.value_type,
                    ),
                ));
            }
            check_finite(key, &p.default_value)?;
        }

        let mut changed = 0;
        for p in params {
            if self.store(p.key.trim(), p.default_value.clone()) {
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn store(&mut self, key: &str, value: RuntimeValue) -> bool {
        if self.values.get(key) == Some(&value) {
            return false;
        }
        log::trace!("runtime param '{key}' = {value}");
        self.values.insert(key.to_string(), value);
        self.revision += 1;
        true
    }
}

fn checked_key(key: &str) -> Result<&str> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ParamError::new(ParamErrorKind::InvalidKey, "runtime param key must not be empty"));
    }
    Ok(key)
}

fn check_finite(key: &str, value: &RuntimeValue) -> Result<()> {
    match value {
        RuntimeValue::Double(v) if !v.is_finite() => Err(ParamError::new(
            ParamErrorKind::NonFiniteNumber,
            format!("value for '{key}' must be finite"),
        )),
        _ => Ok(()),
    }
}

fn add_to_int(current: i64, delta: f64) -> RuntimeValue {
    let integral = delta.fract() == 0.0 && delta >= i64::MIN as f64 && delta < i64::MAX as f64;
    if integral {
        if let Some(sum) = current.checked_add(delta as i64) {
            return RuntimeValue::Int(sum);
        }
    }
    RuntimeValue::Double(current as f64 + delta)
}

// ── Expression lookup ─────────────────────────────────────────────────────

fn operand(value: &RuntimeValue) -> Operand<'_> {
    match value {
        RuntimeValue::Int(v)    => Operand::Number(*v as f64),
        RuntimeValue::Double(v) => Operand::Number(*v),
        RuntimeValue::String(s) => Operand::Text(s),
        RuntimeValue::Bool(_)   => Operand::Unsupported("bool"),
    }
}

impl Resolve for RuntimeParamBridge {
    fn resolve(&self, name: &str) -> Option<Operand<'_>> {
        self.values.get(name).map(operand)
    }

    fn resolve_ignore_case(&self, name: &str) -> Option<Operand<'_>> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| operand(v))
    }
}

#[cfg(test)]
mod tests {
    use marduk_doc::model::RuntimeParamType;

    use super::*;

    fn kind(r: Result<bool>) -> ParamErrorKind {
        r.unwrap_err().kind
    }

    // ── set ───────────────────────────────────────────────────────────────

    #[test]
    fn set_then_adjust() {
        let mut b = RuntimeParamBridge::new();
        assert!(b.set("a", Some(&RuntimeValue::Int(5)), None).unwrap());
        assert!(b.adjust("a", -2.0).unwrap());
        assert_eq!(b.get("a"), Some(&RuntimeValue::Int(3)));
    }

    #[test]
    fn set_same_value_keeps_revision() {
        let mut b = RuntimeParamBridge::new();
        assert_eq!(b.revision(), 1);
        b.set("gain", Some(&0.5.into()), None).unwrap();
        assert_eq!(b.revision(), 2);
        assert!(!b.set("gain", Some(&0.5.into()), None).unwrap());
        assert_eq!(b.revision(), 2);
    }

    #[test]
    fn set_falls_back_to_payload() {
        let mut b = RuntimeParamBridge::new();
        b.set("level", None, Some(&RuntimeValue::Double(0.8))).unwrap();
        assert_eq!(b.get("level"), Some(&RuntimeValue::Double(0.8)));

        b.set("level", Some(&RuntimeValue::Int(1)), Some(&RuntimeValue::Double(0.2))).unwrap();
        assert_eq!(b.get("level"), Some(&RuntimeValue::Int(1)));
    }

    #[test]
    fn set_rejects_bad_input() {
        let mut b = RuntimeParamBridge::new();
        assert_eq!(kind(b.set("  ", Some(&true.into()), None)), ParamErrorKind::InvalidKey);
        assert_eq!(kind(b.set("x", None, None)), ParamErrorKind::UnsupportedType);
        assert_eq!(kind(b.set("x", Some(&f64::NAN.into()), None)), ParamErrorKind::NonFiniteNumber);
        assert!(b.is_empty());
        assert_eq!(b.revision(), 1);
    }

    #[test]
    fn keys_are_trimmed() {
        let mut b = RuntimeParamBridge::new();
        b.set(" mode ", Some(&"bright".into()), None).unwrap();
        assert_eq!(b.get("mode"), Some(&RuntimeValue::String("bright".into())));
    }

    // ── adjust ────────────────────────────────────────────────────────────

    #[test]
    fn adjust_absent_starts_from_zero() {
        let mut b = RuntimeParamBridge::new();
        b.adjust("n", 2.0).unwrap();
        assert_eq!(b.get("n"), Some(&RuntimeValue::Int(2)));
        b.adjust("f", 0.25).unwrap();
        assert_eq!(b.get("f"), Some(&RuntimeValue::Double(0.25)));
    }

    #[test]
    fn adjust_int_promotes_on_fraction_or_overflow() {
        let mut b = RuntimeParamBridge::new();
        b.set("n", Some(&RuntimeValue::Int(1)), None).unwrap();
        b.adjust("n", 0.5).unwrap();
        assert_eq!(b.get("n"), Some(&RuntimeValue::Double(1.5)));

        b.set("big", Some(&RuntimeValue::Int(i64::MAX)), None).unwrap();
        b.adjust("big", 1.0).unwrap();
        assert!(matches!(b.get("big"), Some(RuntimeValue::Double(_))));
    }

    #[test]
    fn adjust_rejects_non_numeric_and_non_finite() {
        let mut b = RuntimeParamBridge::new();
        b.set("flag", Some(&true.into()), None).unwrap();
        b.set("d", Some(&RuntimeValue::Double(f64::MAX)), None).unwrap();
        let rev = b.revision();

        assert_eq!(kind(b.adjust("flag", 1.0)), ParamErrorKind::TypeMismatch);
        assert_eq!(kind(b.adjust("d", f64::INFINITY)), ParamErrorKind::NonFiniteNumber);
        assert_eq!(kind(b.adjust("d", f64::MAX)), ParamErrorKind::NonFiniteNumber);
        assert_eq!(b.get("d"), Some(&RuntimeValue::Double(f64::MAX)));
        assert_eq!(b.revision(), rev);
    }

    #[test]
    fn adjust_by_zero_is_not_a_change() {
        let mut b = RuntimeParamBridge::new();
        b.set("n", Some(&RuntimeValue::Int(4)), None).unwrap();
        assert!(!b.adjust("n", 0.0).unwrap());
    }

    // ── toggle / clear ────────────────────────────────────────────────────

    #[test]
    fn toggle_absent_then_again() {
        let mut b = RuntimeParamBridge::new();
        b.toggle("t").unwrap();
        assert_eq!(b.get("t"), Some(&RuntimeValue::Bool(true)));
        b.toggle("t").unwrap();
        assert_eq!(b.get("t"), Some(&RuntimeValue::Bool(false)));
    }

    #[test]
    fn toggle_coerces_numbers_and_rejects_strings() {
        let mut b = RuntimeParamBridge::new();
        b.set("n", Some(&RuntimeValue::Int(3)), None).unwrap();
        b.toggle("n").unwrap();
        assert_eq!(b.get("n"), Some(&RuntimeValue::Bool(false)));

        b.set("s", Some(&"on".into()), None).unwrap();
        assert_eq!(kind(b.toggle("s")), ParamErrorKind::TypeMismatch);
    }

    #[test]
    fn clear_bumps_revision_once() {
        let mut b = RuntimeParamBridge::new();
        b.set("a", Some(&1_i64.into()), None).unwrap();
        b.set("b", Some(&2_i64.into()), None).unwrap();
        let rev = b.revision();
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.revision(), rev + 1);
    }

    // ── defaults / resolve ────────────────────────────────────────────────

    fn decl(key: &str, value_type: RuntimeParamType, default_value: RuntimeValue) -> RuntimeParamModel {
        RuntimeParamModel {
            key: key.into(),
            value_type,
            default_value,
            description: String::new(),
            exposed: true,
        }
    }

    #[test]
    fn seed_defaults_is_all_or_nothing() {
        let mut b = RuntimeParamBridge::new();
        let bad = [
            decl("gain", RuntimeParamType::Number, 0.5.into()),
            decl("bypass", RuntimeParamType::Boolean, 1_i64.into()),
        ];
        assert_eq!(b.seed_defaults(&bad).unwrap_err().kind, ParamErrorKind::TypeMismatch);
        assert!(b.is_empty());

        let good = [
            decl("gain", RuntimeParamType::Number, 0.5.into()),
            decl("bypass", RuntimeParamType::Boolean, false.into()),
        ];
        assert_eq!(b.seed_defaults(&good).unwrap(), 2);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn resolves_for_expressions() {
        let mut b = RuntimeParamBridge::new();
        b.set("Gain", Some(&RuntimeValue::Int(2)), None).unwrap();
        b.set("label", Some(&"1.5".into()), None).unwrap();
        b.set("flag", Some(&true.into()), None).unwrap();

        assert_eq!(marduk_expr::evaluate("gain * label", &b).unwrap(), 3.0);
        let err = marduk_expr::evaluate("flag + 1", &b).unwrap_err();
        assert!(err.to_string().contains("flag"));
    }
}
