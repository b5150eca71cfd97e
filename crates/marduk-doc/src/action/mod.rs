//! Declarative descriptions of document mutations.
//!
//! An [`Action`] says *what* should change; [`crate::reducer::apply`] is the
//! only code that makes it happen. Every action is checked by
//! [`validate_action`] first, and the validator can also be called on its own
//! to grey out UI commands that would be rejected.

mod validate;

pub use validate::{is_absolute_path, validate_action, validate_property_bag};

use crate::coords::Rect;
use crate::model::{NodeKind, NodeRef, PropertyBag, WidgetId, WidgetType, ROOT_ID};

/// Insert index meaning "after the last element".
pub const APPEND: i32 = -1;

// ── ParentRef ─────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParentKind {
    Root,
    Group,
    Layer,
}

/// Target container of a create/reparent/reorder.
///
/// A root parent must carry [`ROOT_ID`]; any other parent a real id.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub kind: ParentKind,
    pub id: WidgetId,
}

impl ParentRef {
    pub const fn root() -> Self {
        Self { kind: ParentKind::Root, id: ROOT_ID }
    }

    pub const fn group(id: WidgetId) -> Self {
        Self { kind: ParentKind::Group, id }
    }

    pub const fn layer(id: WidgetId) -> Self {
        Self { kind: ParentKind::Layer, id }
    }

    pub fn is_root(&self) -> bool {
        self.kind == ParentKind::Root
    }
}

impl Default for ParentRef {
    fn default() -> Self {
        Self::root()
    }
}

// ── Create ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CreateWidgetPayload {
    pub widget_type: WidgetType,
    pub bounds: Rect,
    pub visible: bool,
    pub locked: bool,
    pub opacity: f32,
    pub properties: PropertyBag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateGroupPayload {
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub opacity: f32,
    pub member_widget_ids: Vec<WidgetId>,
    pub member_group_ids: Vec<WidgetId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateLayerPayload {
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub member_widget_ids: Vec<WidgetId>,
    pub member_group_ids: Vec<WidgetId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreatePayload {
    Widget(CreateWidgetPayload),
    Group(CreateGroupPayload),
    Layer(CreateLayerPayload),
}

impl CreatePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            CreatePayload::Widget(_) => NodeKind::Widget,
            CreatePayload::Group(_)  => NodeKind::Group,
            CreatePayload::Layer(_)  => NodeKind::Layer,
        }
    }
}

/// Creates one widget, group or layer.
///
/// `kind` must agree with the payload variant; the validator checks it so
/// actions assembled from untyped sources (scripts, plugins) are caught.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAction {
    pub kind: NodeKind,
    pub parent: ParentRef,
    /// Position in the target list; [`APPEND`] appends, larger values clamp.
    pub insert_index: i32,
    /// Use this id instead of allocating one. Must be free.
    pub forced_id: Option<WidgetId>,
    pub payload: CreatePayload,
}

impl CreateAction {
    /// A visible, unlocked, fully opaque root-level widget appended on top.
    pub fn widget(widget_type: WidgetType, bounds: Rect) -> Self {
        Self {
            kind: NodeKind::Widget,
            parent: ParentRef::root(),
            insert_index: APPEND,
            forced_id: None,
            payload: CreatePayload::Widget(CreateWidgetPayload {
                widget_type,
                bounds,
                visible: true,
                locked: false,
                opacity: 1.0,
                properties: PropertyBag::new(),
            }),
        }
    }

    pub fn group(name: impl Into<String>, member_widget_ids: Vec<WidgetId>) -> Self {
        Self {
            kind: NodeKind::Group,
            parent: ParentRef::root(),
            insert_index: APPEND,
            forced_id: None,
            payload: CreatePayload::Group(CreateGroupPayload {
                name: name.into(),
                visible: true,
                locked: false,
                opacity: 1.0,
                member_widget_ids,
                member_group_ids: Vec::new(),
            }),
        }
    }

    pub fn layer(name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Layer,
            parent: ParentRef::root(),
            insert_index: APPEND,
            forced_id: None,
            payload: CreatePayload::Layer(CreateLayerPayload {
                name: name.into(),
                visible: true,
                locked: false,
                member_widget_ids: Vec::new(),
                member_group_ids: Vec::new(),
            }),
        }
    }

    pub fn with_forced_id(mut self, id: WidgetId) -> Self {
        self.forced_id = Some(id);
        self
    }

    pub fn at_index(mut self, index: i32) -> Self {
        self.insert_index = index;
        self
    }

    pub fn under(mut self, parent: ParentRef) -> Self {
        self.parent = parent;
        self
    }

    /// Adds a property to a widget payload; ignored for other payloads.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<crate::model::PropertyValue>) -> Self {
        if let CreatePayload::Widget(w) = &mut self.payload {
            w.properties.insert(key.into(), value.into());
        }
        self
    }
}

// ── Delete ────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum GroupDeletePolicy {
    /// Remove the group; its members stay in the document, ungrouped.
    #[default]
    KeepMembers,
    /// Remove the group together with its member widgets and nested groups.
    DeleteMembers,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LayerDeletePolicy {
    /// Remove the layer; its members stay in the document.
    #[default]
    KeepMembers,
    /// Remove the layer together with every widget and group it holds.
    DeleteMembers,
}

/// Kind-specific delete behavior. Group policies only apply to group deletes
/// and layer policies only to layer deletes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeletePolicy {
    Group(GroupDeletePolicy),
    Layer(LayerDeletePolicy),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteAction {
    pub kind: NodeKind,
    pub ids: Vec<WidgetId>,
    pub policy: Option<DeletePolicy>,
}

impl DeleteAction {
    pub fn widgets(ids: Vec<WidgetId>) -> Self {
        Self { kind: NodeKind::Widget, ids, policy: None }
    }

    pub fn groups(ids: Vec<WidgetId>, policy: GroupDeletePolicy) -> Self {
        Self { kind: NodeKind::Group, ids, policy: Some(DeletePolicy::Group(policy)) }
    }

    pub fn layers(ids: Vec<WidgetId>, policy: LayerDeletePolicy) -> Self {
        Self { kind: NodeKind::Layer, ids, policy: Some(DeletePolicy::Layer(policy)) }
    }
}

// ── SetProps ──────────────────────────────────────────────────────────────

/// Changes to a widget. Unset fields are left alone; `properties` entries are
/// merged into the widget's bag, last writer wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetPropsPatch {
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f32>,
    pub bounds: Option<Rect>,
    pub properties: PropertyBag,
}

impl WidgetPropsPatch {
    pub fn is_empty(&self) -> bool {
        self.visible.is_none()
            && self.locked.is_none()
            && self.opacity.is_none()
            && self.bounds.is_none()
            && self.properties.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupPropsPatch {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f32>,
}

impl GroupPropsPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.visible.is_none() && self.locked.is_none() && self.opacity.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerPropsPatch {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
}

impl LayerPropsPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.visible.is_none() && self.locked.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropsPatch {
    Widget(WidgetPropsPatch),
    Group(GroupPropsPatch),
    Layer(LayerPropsPatch),
}

impl PropsPatch {
    pub fn kind(&self) -> NodeKind {
        match self {
            PropsPatch::Widget(_) => NodeKind::Widget,
            PropsPatch::Group(_)  => NodeKind::Group,
            PropsPatch::Layer(_)  => NodeKind::Layer,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PropsPatch::Widget(p) => p.is_empty(),
            PropsPatch::Group(p)  => p.is_empty(),
            PropsPatch::Layer(p)  => p.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetPropsAction {
    pub kind: NodeKind,
    pub ids: Vec<WidgetId>,
    pub patch: PropsPatch,
}

impl SetPropsAction {
    pub fn widgets(ids: Vec<WidgetId>, patch: WidgetPropsPatch) -> Self {
        Self { kind: NodeKind::Widget, ids, patch: PropsPatch::Widget(patch) }
    }

    pub fn groups(ids: Vec<WidgetId>, patch: GroupPropsPatch) -> Self {
        Self { kind: NodeKind::Group, ids, patch: PropsPatch::Group(patch) }
    }

    pub fn layers(ids: Vec<WidgetId>, patch: LayerPropsPatch) -> Self {
        Self { kind: NodeKind::Layer, ids, patch: PropsPatch::Layer(patch) }
    }
}

// ── SetBounds ─────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundsUpdate {
    pub id: WidgetId,
    pub bounds: Rect,
}

/// Overwrites the bounds of one or more widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct SetBoundsAction {
    pub items: Vec<BoundsUpdate>,
}

impl SetBoundsAction {
    pub fn single(id: WidgetId, bounds: Rect) -> Self {
        Self { items: vec![BoundsUpdate { id, bounds }] }
    }
}

// ── Reparent / Reorder ────────────────────────────────────────────────────

/// Moves nodes under `parent`, hoisting them into one contiguous run at
/// `insert_index` (counted among the nodes that are not moving).
#[derive(Debug, Clone, PartialEq)]
pub struct ReparentAction {
    pub refs: Vec<NodeRef>,
    pub parent: ParentRef,
    pub insert_index: i32,
}

/// Same shape as [`ReparentAction`], but only changes order within the
/// current parent; memberships are untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderAction {
    pub refs: Vec<NodeRef>,
    pub parent: ParentRef,
    pub insert_index: i32,
}

// ── Action ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Create(CreateAction),
    Delete(DeleteAction),
    SetProps(SetPropsAction),
    SetBounds(SetBoundsAction),
    Reparent(ReparentAction),
    Reorder(ReorderAction),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Create(_)    => "create",
            Action::Delete(_)    => "delete",
            Action::SetProps(_)  => "setProps",
            Action::SetBounds(_) => "setBounds",
            Action::Reparent(_)  => "reparent",
            Action::Reorder(_)   => "reorder",
        }
    }
}

impl From<CreateAction> for Action {
    fn from(a: CreateAction) -> Self { Action::Create(a) }
}
impl From<DeleteAction> for Action {
    fn from(a: DeleteAction) -> Self { Action::Delete(a) }
}
impl From<SetPropsAction> for Action {
    fn from(a: SetPropsAction) -> Self { Action::SetProps(a) }
}
impl From<SetBoundsAction> for Action {
    fn from(a: SetBoundsAction) -> Self { Action::SetBounds(a) }
}
impl From<ReparentAction> for Action {
    fn from(a: ReparentAction) -> Self { Action::Reparent(a) }
}
impl From<ReorderAction> for Action {
    fn from(a: ReorderAction) -> Self { Action::Reorder(a) }
}
