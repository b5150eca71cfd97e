//! Property bindings: expression results written into widget properties.

use std::cell::Cell;

use marduk_doc::action::{SetPropsAction, WidgetPropsPatch};
use marduk_doc::model::{DocumentModel, PropertyBindingModel, PropertyValue, WidgetModel};
use marduk_expr::Resolve;

/// Whether the applier is currently writing bindings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ApplyState {
    #[default]
    Idle,
    ApplyingBindings,
}

/// Outcome of one [`PropertyBindingApplier::apply_all`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingApplyReport {
    pub evaluated: usize,
    pub applied: usize,
    pub failed: usize,
    /// The pass was refused because another one was already running.
    pub reentrant: bool,
    pub errors: Vec<String>,
}

/// Evaluates property bindings and writes their results through the reducer.
///
/// A pass that starts while another is still running (for example from a
/// resolver that triggers more bindings) returns immediately with
/// `reentrant` set. The guard is a plain `Cell`, so the applier is not
/// `Sync`; evaluating bindings from several threads would need a lock here.
#[derive(Debug, Default)]
pub struct PropertyBindingApplier {
    state: Cell<ApplyState>,
}

struct ApplyGuard<'a>(&'a Cell<ApplyState>);

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(ApplyState::Idle);
    }
}

impl PropertyBindingApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ApplyState {
        self.state.get()
    }

    /// Evaluates every enabled binding in `document` and applies the results.
    ///
    /// A failing binding is logged and skipped; the others still apply.
    pub fn apply_all<R: Resolve + ?Sized>(&self, document: &mut DocumentModel, resolver: &R) -> BindingApplyReport {
        let mut report = BindingApplyReport::default();
        if self.state.get() == ApplyState::ApplyingBindings {
            log::debug!("property binding pass skipped: already applying");
            report.reentrant = true;
            return report;
        }
        self.state.set(ApplyState::ApplyingBindings);
        let _guard = ApplyGuard(&self.state);

        let bindings: Vec<PropertyBindingModel> =
            document.property_bindings.iter().filter(|b| b.enabled).cloned().collect();

        for binding in &bindings {
            report.evaluated += 1;
            match apply_one(document, binding, resolver) {
                Ok(()) => report.applied += 1,
                Err(msg) => {
                    log::warn!(
                        "property binding {} -> widget {}.{} skipped: {msg}",
                        binding.id,
                        binding.target_widget_id,
                        binding.target_property,
                    );
                    report.failed += 1;
                    report.errors.push(format!("binding {}: {msg}", binding.id));
                }
            }
        }

        log::debug!(
            "property bindings: {} evaluated, {} applied, {} failed",
            report.evaluated,
            report.applied,
            report.failed,
        );
        report
    }
}

fn apply_one<R: Resolve + ?Sized>(
    document: &mut DocumentModel,
    binding: &PropertyBindingModel,
    resolver: &R,
) -> Result<(), String> {
    let value = marduk_expr::evaluate(&binding.expression, resolver).map_err(|e| e.to_string())?;
    let widget = document
        .widget(binding.target_widget_id)
        .ok_or_else(|| format!("widget {} not found", binding.target_widget_id))?;
    let patch = patch_for(widget, binding.target_property.trim(), value)?;
    let action = SetPropsAction::widgets(vec![binding.target_widget_id], patch);
    marduk_doc::apply(document, &action.into(), None).map_err(|e| e.to_string())
}

/// Maps a binding target onto widget fields; anything else is a double
/// property.
fn patch_for(widget: &WidgetModel, property: &str, value: f64) -> Result<WidgetPropsPatch, String> {
    let mut patch = WidgetPropsPatch::default();
    let mut bounds = widget.bounds;
    match property {
        "" => return Err("target property must not be blank".to_string()),
        "opacity" => patch.opacity = Some(value.clamp(0.0, 1.0) as f32),
        "visible" => patch.visible = Some(value != 0.0),
        "locked" => patch.locked = Some(value != 0.0),
        "x" => {
            bounds.origin.x = value as f32;
            patch.bounds = Some(bounds);
        }
        "y" => {
            bounds.origin.y = value as f32;
            patch.bounds = Some(bounds);
        }
        "width" => {
            bounds.size.x = value.max(0.0) as f32;
            patch.bounds = Some(bounds);
        }
        "height" => {
            bounds.size.y = value.max(0.0) as f32;
            patch.bounds = Some(bounds);
        }
        other => {
            patch.properties.insert(other.to_string(), PropertyValue::Double(value));
        }
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use marduk_doc::action::CreateAction;
    use marduk_doc::coords::Rect;
    use marduk_doc::model::WidgetType;
    use marduk_expr::Operand;

    use super::*;

    fn binding(id: i64, target: i64, property: &str, expression: &str) -> PropertyBindingModel {
        PropertyBindingModel {
            id,
            name: String::new(),
            enabled: true,
            target_widget_id: target,
            target_property: property.into(),
            expression: expression.into(),
        }
    }

    fn doc() -> DocumentModel {
        let mut doc = DocumentModel::new();
        let a = CreateAction::widget(WidgetType::Meter, Rect::new(10.0, 10.0, 100.0, 20.0));
        marduk_doc::apply(&mut doc, &a.into(), None).unwrap();
        doc
    }

    fn params(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn writes_fields_and_properties() {
        let mut d = doc();
        d.property_bindings = vec![
            binding(20, 1, "value", "level * 0.5"),
            binding(21, 1, "opacity", "level * 4"),
            binding(22, 1, "visible", "level"),
            binding(23, 1, "width", "0 - 5"),
            binding(24, 1, "x", "level * 100"),
        ];
        let report = PropertyBindingApplier::new().apply_all(&mut d, &params(&[("level", 0.5)]));

        assert_eq!(report.evaluated, 5);
        assert_eq!(report.applied, 5);
        let w = d.widget(1).unwrap();
        assert_eq!(w.properties["value"], PropertyValue::Double(0.25));
        assert_eq!(w.opacity, 1.0);
        assert!(w.visible);
        assert_eq!(w.bounds, Rect::new(50.0, 10.0, 0.0, 20.0));
    }

    #[test]
    fn failing_binding_does_not_stop_the_rest() {
        let mut d = doc();
        d.property_bindings = vec![
            binding(20, 1, "a", "missing + 1"),
            binding(21, 1, "b", "1 / 0"),
            binding(22, 9, "c", "1"),
            binding(23, 1, "bounds", "1"),
            binding(24, 1, "d", "2"),
        ];
        d.property_bindings.push(PropertyBindingModel { enabled: false, ..binding(25, 1, "e", "3") });

        let report = PropertyBindingApplier::new().apply_all(&mut d, &params(&[]));
        assert_eq!(report.evaluated, 5);
        assert_eq!(report.applied, 1);
        assert_eq!(report.failed, 4);
        assert!(report.errors[0].contains("missing"));
        assert!(report.errors[1].contains("division by zero"));
        let props = &d.widget(1).unwrap().properties;
        assert_eq!(props.len(), 1);
        assert_eq!(props["d"], PropertyValue::Double(2.0));
    }

    /// A resolver that starts a nested pass on the same applier.
    struct Reentering<'a> {
        applier: &'a PropertyBindingApplier,
        nested: RefCell<Option<BindingApplyReport>>,
    }

    impl Resolve for Reentering<'_> {
        fn resolve(&self, _name: &str) -> Option<Operand<'_>> {
            let mut other = doc();
            other.property_bindings = vec![binding(30, 1, "value", "1")];
            let report = self.applier.apply_all(&mut other, &params(&[]));
            *self.nested.borrow_mut() = Some(report);
            Some(Operand::Number(3.0))
        }
    }

    #[test]
    fn nested_pass_is_refused() {
        let applier = PropertyBindingApplier::new();
        let resolver = Reentering { applier: &applier, nested: RefCell::new(None) };
        let mut d = doc();
        d.property_bindings = vec![binding(20, 1, "value", "gain")];

        let report = applier.apply_all(&mut d, &resolver);
        assert_eq!(report.applied, 1);
        assert!(!report.reentrant);

        let nested = resolver.nested.borrow().clone().unwrap();
        assert!(nested.reentrant);
        assert_eq!(nested.evaluated, 0);
        assert_eq!(applier.state(), ApplyState::Idle);
    }
}
