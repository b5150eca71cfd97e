//! The only code allowed to mutate a [`DocumentModel`].
//!
//! [`apply`] validates the action, checks every reference against the
//! document, and only then mutates. A failed call leaves the document exactly
//! as it was, so each action is atomic and history layers can snapshot before
//! and after without worrying about half-applied edits.
//!
//! Hierarchy support is deliberately narrow: everything lives at the root.
//! Creating or moving nodes under a group or layer parent reports
//! [`DocError::NotSupported`].

use std::collections::HashSet;

use crate::action::{
    validate_action,
    Action,
    CreateAction,
    CreatePayload,
    DeleteAction,
    DeletePolicy,
    GroupDeletePolicy,
    LayerDeletePolicy,
    ParentRef,
    PropsPatch,
    SetBoundsAction,
    SetPropsAction,
    WidgetPropsPatch,
};
use crate::error::{DocError, Result};
use crate::model::{
    DocumentModel,
    GroupModel,
    LayerModel,
    NodeKind,
    NodeRef,
    WidgetId,
    WidgetModel,
    ROOT_ID,
};

/// Applies `action` to `doc`.
///
/// On success, ids of newly created nodes are appended to `created_ids`.
pub fn apply(
    doc: &mut DocumentModel,
    action: &Action,
    created_ids: Option<&mut Vec<WidgetId>>,
) -> Result<()> {
    validate_action(action)?;

    let result = match action {
        Action::Create(a)    => apply_create(doc, a, created_ids),
        Action::Delete(a)    => apply_delete(doc, a),
        Action::SetProps(a)  => apply_set_props(doc, a),
        Action::SetBounds(a) => apply_set_bounds(doc, a),
        Action::Reparent(a)  => apply_move(doc, &a.refs, a.parent, a.insert_index, true),
        Action::Reorder(a)   => apply_move(doc, &a.refs, a.parent, a.insert_index, false),
    };

    match &result {
        Ok(()) => log::trace!("applied {} action", action.name()),
        Err(e) => log::debug!("rejected {} action: {e}", action.name()),
    }
    result
}

// ── Create ────────────────────────────────────────────────────────────────

fn apply_create(
    doc: &mut DocumentModel,
    a: &CreateAction,
    created_ids: Option<&mut Vec<WidgetId>>,
) -> Result<()> {
    if !a.parent.is_root() {
        return Err(DocError::NotSupported(format!("creating a {} under a non-root parent", a.kind)));
    }
    let id = allocate_id(doc, a.kind, a.forced_id)?;

    match &a.payload {
        CreatePayload::Widget(p) => {
            let widget = WidgetModel {
                id,
                widget_type: p.widget_type,
                bounds: p.bounds,
                visible: p.visible,
                locked: p.locked,
                opacity: p.opacity,
                properties: p.properties.clone(),
            };
            insert_clamped(&mut doc.widgets, a.insert_index, widget);
        }
        CreatePayload::Group(p) => {
            require_all(doc, NodeKind::Widget, &p.member_widget_ids)?;
            require_all(doc, NodeKind::Group, &p.member_group_ids)?;
            let group = GroupModel {
                id,
                name: p.name.trim().to_string(),
                visible: p.visible,
                locked: p.locked,
                opacity: p.opacity,
                member_widget_ids: p.member_widget_ids.clone(),
                member_group_ids: p.member_group_ids.clone(),
                parent_group_id: None,
            };
            for child in &p.member_group_ids {
                let old_parent = doc.group(*child).and_then(|g| g.parent_group_id);
                if let Some(old) = old_parent.and_then(|pid| doc.group_mut(pid)) {
                    old.member_group_ids.retain(|g| g != child);
                }
                if let Some(g) = doc.group_mut(*child) {
                    g.parent_group_id = Some(id);
                }
            }
            insert_clamped(&mut doc.groups, a.insert_index, group);
        }
        CreatePayload::Layer(p) => {
            require_all(doc, NodeKind::Widget, &p.member_widget_ids)?;
            require_all(doc, NodeKind::Group, &p.member_group_ids)?;
            let layer = LayerModel {
                id,
                name: p.name.trim().to_string(),
                order: 0,
                visible: p.visible,
                locked: p.locked,
                member_widget_ids: p.member_widget_ids.clone(),
                member_group_ids: p.member_group_ids.clone(),
            };
            insert_clamped(&mut doc.layers, a.insert_index, layer);
            renumber_layers(doc);
        }
    }

    log::debug!("created {} {id}", a.kind);
    if let Some(out) = created_ids {
        out.push(id);
    }
    Ok(())
}

/// Picks the id for a new node.
///
/// A forced id is used as-is when free. Otherwise the next id is one past the
/// largest id in the document, saturating at `i64::MAX`; a saturated id that
/// is already taken means the id space is exhausted.
fn allocate_id(doc: &DocumentModel, kind: NodeKind, forced: Option<WidgetId>) -> Result<WidgetId> {
    if let Some(id) = forced {
        if doc.contains_id(id) {
            return Err(DocError::AlreadyExists { kind, id });
        }
        return Ok(id);
    }

    let next = doc.max_id().max(ROOT_ID).saturating_add(1);
    if next <= ROOT_ID || doc.contains_id(next) {
        return Err(DocError::IdExhausted);
    }
    Ok(next)
}

// ── Delete ────────────────────────────────────────────────────────────────

fn apply_delete(doc: &mut DocumentModel, a: &DeleteAction) -> Result<()> {
    require_all(doc, a.kind, &a.ids)?;
    let ids: HashSet<WidgetId> = a.ids.iter().copied().collect();

    match a.kind {
        NodeKind::Widget => remove_widgets(doc, &ids),
        NodeKind::Group => {
            let policy = match a.policy {
                Some(DeletePolicy::Group(p)) => p,
                _ => GroupDeletePolicy::default(),
            };
            let (widgets, groups) = match policy {
                GroupDeletePolicy::KeepMembers => (HashSet::new(), ids),
                GroupDeletePolicy::DeleteMembers => expand_groups(doc, &ids),
            };
            remove_widgets(doc, &widgets);
            remove_groups(doc, &groups);
        }
        NodeKind::Layer => {
            let policy = match a.policy {
                Some(DeletePolicy::Layer(p)) => p,
                _ => LayerDeletePolicy::default(),
            };
            if policy == LayerDeletePolicy::DeleteMembers {
                let mut widgets: HashSet<WidgetId> = HashSet::new();
                let mut groups: HashSet<WidgetId> = HashSet::new();
                for layer in doc.layers.iter().filter(|l| ids.contains(&l.id)) {
                    widgets.extend(layer.member_widget_ids.iter().copied());
                    groups.extend(layer.member_group_ids.iter().copied());
                }
                let (nested_widgets, all_groups) = expand_groups(doc, &groups);
                widgets.extend(nested_widgets);
                remove_widgets(doc, &widgets);
                remove_groups(doc, &all_groups);
            }
            doc.layers.retain(|l| !ids.contains(&l.id));
            renumber_layers(doc);
        }
    }

    log::debug!("deleted {} {}(s): {:?}", a.ids.len(), a.kind, a.ids);
    Ok(())
}

/// Closure of `roots` over nested groups, plus every widget those groups hold.
fn expand_groups(doc: &DocumentModel, roots: &HashSet<WidgetId>) -> (HashSet<WidgetId>, HashSet<WidgetId>) {
    let mut groups: HashSet<WidgetId> = HashSet::new();
    let mut widgets: HashSet<WidgetId> = HashSet::new();
    let mut stack: Vec<WidgetId> = roots.iter().copied().collect();

    while let Some(id) = stack.pop() {
        if !groups.insert(id) {
            continue;
        }
        if let Some(g) = doc.group(id) {
            widgets.extend(g.member_widget_ids.iter().copied());
            stack.extend(g.member_group_ids.iter().copied());
        }
    }
    (widgets, groups)
}

fn remove_widgets(doc: &mut DocumentModel, ids: &HashSet<WidgetId>) {
    if ids.is_empty() {
        return;
    }
    doc.widgets.retain(|w| !ids.contains(&w.id));
    for g in &mut doc.groups {
        g.member_widget_ids.retain(|id| !ids.contains(id));
    }
    for l in &mut doc.layers {
        l.member_widget_ids.retain(|id| !ids.contains(id));
    }
}

fn remove_groups(doc: &mut DocumentModel, ids: &HashSet<WidgetId>) {
    if ids.is_empty() {
        return;
    }
    doc.groups.retain(|g| !ids.contains(&g.id));
    for g in &mut doc.groups {
        g.member_group_ids.retain(|id| !ids.contains(id));
        if g.parent_group_id.is_some_and(|p| ids.contains(&p)) {
            g.parent_group_id = None;
        }
    }
    for l in &mut doc.layers {
        l.member_group_ids.retain(|id| !ids.contains(id));
    }
}

// ── SetProps / SetBounds ──────────────────────────────────────────────────

fn apply_set_props(doc: &mut DocumentModel, a: &SetPropsAction) -> Result<()> {
    require_all(doc, a.kind, &a.ids)?;

    for &id in &a.ids {
        match &a.patch {
            PropsPatch::Widget(p) => {
                if let Some(w) = doc.widget_mut(id) {
                    patch_widget(w, p);
                }
            }
            PropsPatch::Group(p) => {
                if let Some(g) = doc.group_mut(id) {
                    if let Some(name) = &p.name { g.name = name.trim().to_string(); }
                    if let Some(v) = p.visible { g.visible = v; }
                    if let Some(v) = p.locked { g.locked = v; }
                    if let Some(v) = p.opacity { g.opacity = v; }
                }
            }
            PropsPatch::Layer(p) => {
                if let Some(l) = doc.layer_mut(id) {
                    if let Some(name) = &p.name { l.name = name.trim().to_string(); }
                    if let Some(v) = p.visible { l.visible = v; }
                    if let Some(v) = p.locked { l.locked = v; }
                }
            }
        }
    }
    Ok(())
}

fn patch_widget(w: &mut WidgetModel, p: &WidgetPropsPatch) {
    if let Some(bounds) = p.bounds { w.bounds = bounds; }
    if let Some(v) = p.visible { w.visible = v; }
    if let Some(v) = p.locked { w.locked = v; }
    if let Some(v) = p.opacity { w.opacity = v; }
    for (key, value) in &p.properties {
        w.properties.insert(key.clone(), value.clone());
    }
}

fn apply_set_bounds(doc: &mut DocumentModel, a: &SetBoundsAction) -> Result<()> {
    let ids: Vec<WidgetId> = a.items.iter().map(|i| i.id).collect();
    require_all(doc, NodeKind::Widget, &ids)?;
    for item in &a.items {
        if let Some(w) = doc.widget_mut(item.id) {
            w.bounds = item.bounds;
        }
    }
    Ok(())
}

// ── Reparent / Reorder ────────────────────────────────────────────────────

/// Anything stored in an ordered, id-keyed document list.
trait Identified {
    fn node_id(&self) -> WidgetId;
}

impl Identified for WidgetModel {
    fn node_id(&self) -> WidgetId { self.id }
}
impl Identified for GroupModel {
    fn node_id(&self) -> WidgetId { self.id }
}
impl Identified for LayerModel {
    fn node_id(&self) -> WidgetId { self.id }
}

fn apply_move(
    doc: &mut DocumentModel,
    refs: &[NodeRef],
    parent: ParentRef,
    insert_index: i32,
    reparent: bool,
) -> Result<()> {
    let verb = if reparent { "reparenting" } else { "reordering" };
    if !parent.is_root() {
        return Err(DocError::NotSupported(format!("{verb} under a non-root parent")));
    }

    // Validation guarantees at least one ref and a single kind.
    let kind = refs[0].kind;
    let ids: Vec<WidgetId> = refs.iter().map(|r| r.id).collect();
    require_all(doc, kind, &ids)?;
    let set: HashSet<WidgetId> = ids.iter().copied().collect();

    match kind {
        NodeKind::Widget => {
            hoist(&mut doc.widgets, kind, &ids, insert_index)?;
            if reparent {
                for g in &mut doc.groups {
                    g.member_widget_ids.retain(|id| !set.contains(id));
                }
            }
        }
        NodeKind::Group => {
            hoist(&mut doc.groups, kind, &ids, insert_index)?;
            if reparent {
                for g in &mut doc.groups {
                    g.member_group_ids.retain(|id| !set.contains(id));
                    if set.contains(&g.id) {
                        g.parent_group_id = None;
                    }
                }
            }
        }
        NodeKind::Layer => {
            hoist(&mut doc.layers, kind, &ids, insert_index)?;
            renumber_layers(doc);
        }
    }

    log::debug!("{verb} {} {}(s) to index {insert_index}", ids.len(), kind);
    Ok(())
}

/// Moves every item whose id is in `ids` into one contiguous run.
///
/// Items keep their relative order in both the moved run and the remainder.
/// `insert_index` counts positions among the remaining items. Each requested
/// id must match exactly one item; otherwise nothing moves.
fn hoist<T: Identified>(items: &mut Vec<T>, kind: NodeKind, ids: &[WidgetId], insert_index: i32) -> Result<()> {
    let set: HashSet<WidgetId> = ids.iter().copied().collect();
    let moved_count = items.iter().filter(|it| set.contains(&it.node_id())).count();
    if moved_count != set.len() {
        let id = ids
            .iter()
            .copied()
            .find(|id| items.iter().filter(|it| it.node_id() == *id).count() != 1)
            .unwrap_or(ids[0]);
        return Err(DocError::NotFound { kind, id });
    }

    let (moved, mut remaining): (Vec<T>, Vec<T>) =
        std::mem::take(items).into_iter().partition(|it| set.contains(&it.node_id()));
    let at = clamp_index(insert_index, remaining.len());
    remaining.splice(at..at, moved);
    *items = remaining;
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────

fn require_all(doc: &DocumentModel, kind: NodeKind, ids: &[WidgetId]) -> Result<()> {
    match ids.iter().find(|id| !doc.contains(kind, **id)) {
        Some(&id) => Err(DocError::NotFound { kind, id }),
        None => Ok(()),
    }
}

/// Negative means append; anything past the end clamps to the end.
fn clamp_index(index: i32, len: usize) -> usize {
    if index < 0 {
        len
    } else {
        (index as usize).min(len)
    }
}

fn insert_clamped<T>(items: &mut Vec<T>, index: i32, item: T) {
    let at = clamp_index(index, items.len());
    items.insert(at, item);
}

fn renumber_layers(doc: &mut DocumentModel) {
    for (i, layer) in doc.layers.iter_mut().enumerate() {
        layer.order = i as i32;
    }
}
