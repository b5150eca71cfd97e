use crate::coords::Rect;
use crate::error::{DocError, Result};
use crate::model::{NodeKind, NodeRef, PropertyBag, PropertyValue, WidgetId, RESERVED_BOUNDS_KEY, ROOT_ID};

use super::{
    Action,
    CreateAction,
    CreatePayload,
    DeleteAction,
    DeletePolicy,
    ParentKind,
    ParentRef,
    PropsPatch,
    SetBoundsAction,
    SetPropsAction,
    APPEND,
};

/// Checks an action's structure without looking at any document.
///
/// Pure and side-effect free. [`crate::reducer::apply`] always calls this
/// first; callers may also use it as a pre-flight check.
pub fn validate_action(action: &Action) -> Result<()> {
    match action {
        Action::Create(a)    => validate_create(a),
        Action::Delete(a)    => validate_delete(a),
        Action::SetProps(a)  => validate_set_props(a),
        Action::SetBounds(a) => validate_set_bounds(a),
        Action::Reparent(a)  => validate_move("reparent", &a.refs, a.parent, a.insert_index),
        Action::Reorder(a)   => validate_move("reorder", &a.refs, a.parent, a.insert_index),
    }
}

// ── Per-action rules ──────────────────────────────────────────────────────

fn validate_create(a: &CreateAction) -> Result<()> {
    if a.kind != a.payload.kind() {
        return Err(DocError::invalid(format!(
            "create kind {} does not match a {} payload",
            a.kind,
            a.payload.kind()
        )));
    }
    validate_parent(a.parent)?;
    validate_insert_index(a.insert_index)?;
    if let Some(id) = a.forced_id {
        validate_id(id, "forced id")?;
    }

    match &a.payload {
        CreatePayload::Widget(w) => {
            validate_bounds(w.bounds, "widget bounds")?;
            validate_opacity(w.opacity)?;
            validate_property_bag(&w.properties)
        }
        CreatePayload::Group(g) => {
            validate_name(&g.name, "group")?;
            validate_opacity(g.opacity)?;
            validate_member_ids(&g.member_widget_ids, "member widget ids")?;
            validate_member_ids(&g.member_group_ids, "member group ids")
        }
        CreatePayload::Layer(l) => {
            if !a.parent.is_root() {
                return Err(DocError::invalid("layers can only be created under the root"));
            }
            validate_name(&l.name, "layer")?;
            validate_member_ids(&l.member_widget_ids, "member widget ids")?;
            validate_member_ids(&l.member_group_ids, "member group ids")
        }
    }
}

fn validate_delete(a: &DeleteAction) -> Result<()> {
    validate_ids(&a.ids, "delete ids")?;
    match (a.kind, a.policy) {
        (_, None) => Ok(()),
        (NodeKind::Group, Some(DeletePolicy::Group(_))) => Ok(()),
        (NodeKind::Layer, Some(DeletePolicy::Layer(_))) => Ok(()),
        (NodeKind::Widget, Some(_)) => Err(DocError::invalid("widget deletes take no delete policy")),
        (NodeKind::Group, Some(DeletePolicy::Layer(_))) => {
            Err(DocError::invalid("a layer delete policy cannot be applied to groups"))
        }
        (NodeKind::Layer, Some(DeletePolicy::Group(_))) => {
            Err(DocError::invalid("a group delete policy cannot be applied to layers"))
        }
    }
}

fn validate_set_props(a: &SetPropsAction) -> Result<()> {
    if a.kind != a.patch.kind() {
        return Err(DocError::invalid(format!(
            "setProps kind {} does not match a {} patch",
            a.kind,
            a.patch.kind()
        )));
    }
    validate_ids(&a.ids, "setProps ids")?;
    if a.patch.is_empty() {
        return Err(DocError::invalid("setProps patch changes nothing"));
    }

    match &a.patch {
        PropsPatch::Widget(p) => {
            if let Some(bounds) = p.bounds {
                validate_bounds(bounds, "widget bounds")?;
            }
            if let Some(opacity) = p.opacity {
                validate_opacity(opacity)?;
            }
            validate_property_bag(&p.properties)
        }
        PropsPatch::Group(p) => {
            if let Some(name) = &p.name {
                validate_name(name, "group")?;
            }
            if let Some(opacity) = p.opacity {
                validate_opacity(opacity)?;
            }
            Ok(())
        }
        PropsPatch::Layer(p) => {
            if let Some(name) = &p.name {
                validate_name(name, "layer")?;
            }
            Ok(())
        }
    }
}

fn validate_set_bounds(a: &SetBoundsAction) -> Result<()> {
    let ids: Vec<WidgetId> = a.items.iter().map(|i| i.id).collect();
    validate_ids(&ids, "setBounds ids")?;
    for item in &a.items {
        validate_bounds(item.bounds, "widget bounds")?;
    }
    Ok(())
}

fn validate_move(verb: &str, refs: &[NodeRef], parent: ParentRef, insert_index: i32) -> Result<()> {
    let Some(first) = refs.first() else {
        return Err(DocError::invalid(format!("{verb} needs at least one node")));
    };
    if refs.iter().any(|r| r.kind != first.kind) {
        return Err(DocError::invalid(format!("{verb} cannot mix node kinds in one action")));
    }
    let ids: Vec<WidgetId> = refs.iter().map(|r| r.id).collect();
    validate_ids(&ids, &format!("{verb} ids"))?;
    validate_parent(parent)?;
    validate_insert_index(insert_index)?;

    if first.kind == NodeKind::Layer && !parent.is_root() {
        return Err(DocError::invalid(format!("{verb} of layers requires the root parent")));
    }
    if parent.kind == ParentKind::Group
        && first.kind == NodeKind::Group
        && ids.contains(&parent.id)
    {
        return Err(DocError::invalid(format!(
            "{verb} cannot move group {} into itself",
            parent.id
        )));
    }
    Ok(())
}

// ── Shared rules ──────────────────────────────────────────────────────────

fn validate_id(id: WidgetId, what: &str) -> Result<()> {
    if id <= ROOT_ID {
        return Err(DocError::invalid(format!("{what} {id} is not a valid id")));
    }
    Ok(())
}

/// Non-empty, every id valid, no duplicates.
fn validate_ids(ids: &[WidgetId], what: &str) -> Result<()> {
    if ids.is_empty() {
        return Err(DocError::invalid(format!("{what} must not be empty")));
    }
    validate_member_ids(ids, what)
}

/// Like [`validate_ids`] but an empty list is fine.
fn validate_member_ids(ids: &[WidgetId], what: &str) -> Result<()> {
    for &id in ids {
        validate_id(id, what)?;
    }
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(DocError::invalid(format!("{what} contain duplicate id {}", pair[0])));
    }
    Ok(())
}

fn validate_parent(parent: ParentRef) -> Result<()> {
    match parent.kind {
        ParentKind::Root if parent.id != ROOT_ID => Err(DocError::invalid(format!(
            "root parent must carry id {ROOT_ID}, got {}",
            parent.id
        ))),
        ParentKind::Root => Ok(()),
        ParentKind::Group | ParentKind::Layer => validate_id(parent.id, "parent"),
    }
}

fn validate_insert_index(index: i32) -> Result<()> {
    if index < APPEND {
        return Err(DocError::invalid(format!("insert index {index} is negative")));
    }
    Ok(())
}

fn validate_bounds(bounds: Rect, what: &str) -> Result<()> {
    if !bounds.is_finite() {
        return Err(DocError::invalid(format!("{what} must be finite")));
    }
    if bounds.size.x < 0.0 || bounds.size.y < 0.0 {
        return Err(DocError::invalid(format!("{what} must have non-negative width and height")));
    }
    Ok(())
}

fn validate_opacity(opacity: f32) -> Result<()> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(DocError::invalid(format!("opacity {opacity} is outside [0, 1]")));
    }
    Ok(())
}

fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DocError::invalid(format!("{what} name must not be blank")));
    }
    Ok(())
}

/// Checks a widget property bag against the allowed-value rules.
///
/// - keys must be non-blank and must not be the reserved `"bounds"` key
/// - floating-point components must be finite
/// - string values under keys containing `"path"` must be relative
pub fn validate_property_bag(bag: &PropertyBag) -> Result<()> {
    for (key, value) in bag {
        if key.trim().is_empty() {
            return Err(DocError::invalid("property keys must not be blank"));
        }
        if key.trim().eq_ignore_ascii_case(RESERVED_BOUNDS_KEY) {
            return Err(DocError::invalid(format!(
                "property key {key:?} is reserved; set bounds on the widget instead"
            )));
        }
        if !value.is_finite() {
            return Err(DocError::invalid(format!("property {key:?} holds a non-finite number")));
        }
        if let PropertyValue::String(s) = value
            && key.to_lowercase().contains("path")
            && is_absolute_path(s)
        {
            return Err(DocError::invalid(format!(
                "property {key:?} must hold a project-relative path, got {s:?}"
            )));
        }
    }
    Ok(())
}

/// Unix roots, Windows drive prefixes (`C:\`, `C:/`) and UNC/backslash roots.
pub fn is_absolute_path(s: &str) -> bool {
    let s = s.trim();
    let b = s.as_bytes();
    if s.starts_with('/') || s.starts_with('\\') {
        return true;
    }
    b.len() >= 3 && b[0].is_ascii_alphabetic() && b[1] == b':' && (b[2] == b'/' || b[2] == b'\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{
        BoundsUpdate,
        GroupDeletePolicy,
        GroupPropsPatch,
        LayerDeletePolicy,
        LayerPropsPatch,
        ReorderAction,
        ReparentAction,
        WidgetPropsPatch,
    };
    use crate::model::WidgetType;

    fn rect() -> Rect { Rect::new(0.0, 0.0, 10.0, 10.0) }

    fn ok(a: impl Into<Action>) { validate_action(&a.into()).unwrap(); }
    fn err(a: impl Into<Action>) -> String { validate_action(&a.into()).unwrap_err().to_string() }

    fn props(pairs: &[(&str, PropertyValue)]) -> WidgetPropsPatch {
        WidgetPropsPatch {
            properties: pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect(),
            ..Default::default()
        }
    }

    // ── id lists ──────────────────────────────────────────────────────────

    #[test] fn delete_requires_ids() { err(DeleteAction::widgets(vec![])); }
    #[test] fn delete_rejects_root_id() { err(DeleteAction::widgets(vec![1, 0])); }
    #[test] fn delete_rejects_negative_id() { err(DeleteAction::widgets(vec![-3])); }

    #[test]
    fn delete_rejects_duplicates() {
        assert!(err(DeleteAction::widgets(vec![4, 2, 4])).contains("duplicate id 4"));
    }

    // ── parents ───────────────────────────────────────────────────────────

    #[test]
    fn root_parent_must_carry_sentinel() {
        let a = CreateAction::widget(WidgetType::Button, rect())
            .under(ParentRef { kind: ParentKind::Root, id: 5 });
        err(a);
    }

    #[test]
    fn group_parent_needs_real_id() {
        err(CreateAction::widget(WidgetType::Button, rect()).under(ParentRef::group(0)));
        ok(CreateAction::widget(WidgetType::Button, rect()).under(ParentRef::group(3)));
    }

    // ── create ────────────────────────────────────────────────────────────

    #[test]
    fn create_kind_must_match_payload() {
        let mut a = CreateAction::widget(WidgetType::Slider, rect());
        a.kind = NodeKind::Group;
        assert!(err(a).contains("does not match"));
    }

    #[test]
    fn create_rejects_bad_geometry() {
        err(CreateAction::widget(WidgetType::Knob, Rect::new(f32::NAN, 0.0, 1.0, 1.0)));
        err(CreateAction::widget(WidgetType::Knob, Rect::new(0.0, 0.0, -1.0, 1.0)));
        ok(CreateAction::widget(WidgetType::Knob, Rect::new(-5.0, -5.0, 0.0, 0.0)));
    }

    #[test]
    fn create_rejects_bad_insert_index() {
        err(CreateAction::widget(WidgetType::Knob, rect()).at_index(-2));
        ok(CreateAction::widget(WidgetType::Knob, rect()).at_index(APPEND));
    }

    #[test]
    fn create_rejects_invalid_forced_id() {
        err(CreateAction::widget(WidgetType::Label, rect()).with_forced_id(0));
    }

    #[test]
    fn create_layer_only_under_root() {
        err(CreateAction::layer("fx").under(ParentRef::group(2)));
        err(CreateAction::layer("  "));
        ok(CreateAction::layer("fx"));
    }

    #[test]
    fn create_group_member_ids_checked() {
        err(CreateAction::group("g", vec![1, 1]));
        ok(CreateAction::group("g", vec![]));
    }

    // ── property bag ──────────────────────────────────────────────────────

    #[test]
    fn bounds_key_is_reserved() {
        let a = SetPropsAction::widgets(vec![1], props(&[("bounds", PropertyValue::Rect(rect()))]));
        assert!(err(a).contains("reserved"));
    }

    #[test]
    fn absolute_paths_rejected_under_path_keys() {
        err(SetPropsAction::widgets(vec![1], props(&[("imagePath", "/etc/passwd".into())])));
        err(SetPropsAction::widgets(vec![1], props(&[("fontPath", "C:\\fonts\\a.ttf".into())])));
        ok(SetPropsAction::widgets(vec![1], props(&[("imagePath", "assets/x.png".into())])));
    }

    #[test]
    fn absolute_values_fine_under_other_keys() {
        ok(SetPropsAction::widgets(vec![1], props(&[("text", "/usr/bin".into())])));
    }

    #[test]
    fn non_finite_property_rejected() {
        err(SetPropsAction::widgets(vec![1], props(&[("value", PropertyValue::Double(f64::INFINITY))])));
    }

    #[test]
    fn blank_property_key_rejected() {
        err(SetPropsAction::widgets(vec![1], props(&[(" ", true.into())])));
    }

    #[test]
    fn absolute_path_forms() {
        assert!(is_absolute_path("/a"));
        assert!(is_absolute_path("\\\\server\\share"));
        assert!(is_absolute_path("d:/x"));
        assert!(!is_absolute_path("assets/x.png"));
        assert!(!is_absolute_path("c:relative"));
        assert!(!is_absolute_path(""));
    }

    // ── set props ─────────────────────────────────────────────────────────

    #[test]
    fn empty_patch_is_an_error() {
        assert!(err(SetPropsAction::widgets(vec![1], WidgetPropsPatch::default())).contains("changes nothing"));
        err(SetPropsAction::groups(vec![1], GroupPropsPatch::default()));
        err(SetPropsAction::layers(vec![1], LayerPropsPatch::default()));
    }

    #[test]
    fn patch_kind_must_match() {
        let mut a = SetPropsAction::widgets(vec![1], WidgetPropsPatch { visible: Some(false), ..Default::default() });
        a.kind = NodeKind::Layer;
        err(a);
    }

    #[test]
    fn opacity_range() {
        err(SetPropsAction::widgets(vec![1], WidgetPropsPatch { opacity: Some(1.5), ..Default::default() }));
        err(SetPropsAction::groups(vec![1], GroupPropsPatch { opacity: Some(f32::NAN), ..Default::default() }));
        ok(SetPropsAction::widgets(vec![1], WidgetPropsPatch { opacity: Some(0.0), ..Default::default() }));
    }

    #[test]
    fn rename_to_blank_rejected() {
        err(SetPropsAction::layers(vec![1], LayerPropsPatch { name: Some("".into()), ..Default::default() }));
    }

    // ── set bounds ────────────────────────────────────────────────────────

    #[test]
    fn set_bounds_rules() {
        err(SetBoundsAction { items: vec![] });
        err(SetBoundsAction::single(1, Rect::new(0.0, 0.0, 1.0, -1.0)));
        err(SetBoundsAction {
            items: vec![BoundsUpdate { id: 2, bounds: rect() }, BoundsUpdate { id: 2, bounds: rect() }],
        });
        ok(SetBoundsAction::single(1, rect()));
    }

    // ── delete policies ───────────────────────────────────────────────────

    #[test]
    fn delete_policies_are_not_cross_applied() {
        let mut a = DeleteAction::groups(vec![1], GroupDeletePolicy::DeleteMembers);
        a.policy = Some(DeletePolicy::Layer(LayerDeletePolicy::KeepMembers));
        err(a);

        let mut b = DeleteAction::layers(vec![1], LayerDeletePolicy::KeepMembers);
        b.policy = Some(DeletePolicy::Group(GroupDeletePolicy::KeepMembers));
        err(b);

        let mut c = DeleteAction::widgets(vec![1]);
        c.policy = Some(DeletePolicy::Group(GroupDeletePolicy::KeepMembers));
        err(c);

        ok(DeleteAction::groups(vec![1], GroupDeletePolicy::KeepMembers));
        ok(DeleteAction { kind: NodeKind::Layer, ids: vec![1], policy: None });
    }

    // ── reparent / reorder ────────────────────────────────────────────────

    #[test]
    fn move_refs_share_one_kind() {
        let a = ReorderAction {
            refs: vec![NodeRef::widget(1), NodeRef::group(2)],
            parent: ParentRef::root(),
            insert_index: 0,
        };
        assert!(err(a).contains("mix"));
    }

    #[test]
    fn move_layers_requires_root() {
        err(ReparentAction { refs: vec![NodeRef::layer(1)], parent: ParentRef::group(4), insert_index: 0 });
        ok(ReorderAction { refs: vec![NodeRef::layer(1)], parent: ParentRef::root(), insert_index: 0 });
    }

    #[test]
    fn group_cannot_move_into_itself() {
        let a = ReparentAction {
            refs: vec![NodeRef::group(3), NodeRef::group(7)],
            parent: ParentRef::group(7),
            insert_index: APPEND,
        };
        assert!(err(a).contains("into itself"));
    }

    #[test]
    fn move_requires_refs() {
        err(ReparentAction { refs: vec![], parent: ParentRef::root(), insert_index: 0 });
    }
}
