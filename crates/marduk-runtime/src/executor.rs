//! Executes one runtime action.
//!
//! Parameter actions go straight to the [`RuntimeParamBridge`]. Actions that
//! edit widgets are turned into document actions and handed to hooks on the
//! [`ExecutorContext`], which normally forward to [`marduk_doc::apply`].
//! Those widget actions are only allowed on the UI thread.

use marduk_doc::action::{
    Action,
    GroupPropsPatch,
    LayerPropsPatch,
    PropsPatch,
    SetBoundsAction,
    SetPropsAction,
    WidgetPropsPatch,
};
use marduk_doc::model::{DocumentModel, NodeKind, NodeRef, PropertyBag, RuntimeActionModel, RuntimeValue};
use marduk_doc::DocError;

use crate::params::{ParamError, RuntimeParamBridge};

// ── Thread policy ─────────────────────────────────────────────────────────

/// The thread a dispatch claims to run on. Asserted by the caller, not
/// detected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RuntimeDispatchThread {
    #[default]
    UiMessage,
    WorkerBackground,
    RealtimeAudio,
}

impl RuntimeDispatchThread {
    pub fn is_ui(self) -> bool {
        self == RuntimeDispatchThread::UiMessage
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeDispatchThread::UiMessage        => "ui",
            RuntimeDispatchThread::WorkerBackground => "worker",
            RuntimeDispatchThread::RealtimeAudio    => "audio",
        }
    }
}

// ── Context ───────────────────────────────────────────────────────────────

/// Applies a document action on behalf of a runtime action.
pub type DocumentHook<'a> = Box<dyn FnMut(&mut DocumentModel, &Action) -> Result<(), DocError> + 'a>;

/// Receives a UI-affecting action that could not run on the current thread.
pub type DeferHook<'a> = Box<dyn FnMut(&RuntimeActionModel) + 'a>;

/// Everything an executor may touch besides the document.
pub struct ExecutorContext<'a> {
    pub params: &'a mut RuntimeParamBridge,
    pub apply_set_props: Option<DocumentHook<'a>>,
    pub apply_set_bounds: Option<DocumentHook<'a>>,
    pub dispatch_thread: RuntimeDispatchThread,
    pub defer_ui_action: Option<DeferHook<'a>>,
}

fn reducer_hook(document: &mut DocumentModel, action: &Action) -> Result<(), DocError> {
    marduk_doc::apply(document, action, None)
}

impl<'a> ExecutorContext<'a> {
    /// A UI-thread context with no document hooks.
    pub fn new(params: &'a mut RuntimeParamBridge) -> Self {
        Self {
            params,
            apply_set_props: None,
            apply_set_bounds: None,
            dispatch_thread: RuntimeDispatchThread::UiMessage,
            defer_ui_action: None,
        }
    }

    /// A UI-thread context whose document hooks call [`marduk_doc::apply`].
    pub fn with_reducer(params: &'a mut RuntimeParamBridge) -> Self {
        Self::new(params)
            .set_props_hook(reducer_hook)
            .set_bounds_hook(reducer_hook)
    }

    pub fn on_thread(mut self, thread: RuntimeDispatchThread) -> Self {
        self.dispatch_thread = thread;
        self
    }

    pub fn set_props_hook(
        mut self,
        f: impl FnMut(&mut DocumentModel, &Action) -> Result<(), DocError> + 'a,
    ) -> Self {
        self.apply_set_props = Some(Box::new(f));
        self
    }

    pub fn set_bounds_hook(
        mut self,
        f: impl FnMut(&mut DocumentModel, &Action) -> Result<(), DocError> + 'a,
    ) -> Self {
        self.apply_set_bounds = Some(Box::new(f));
        self
    }

    pub fn defer_with(mut self, f: impl FnMut(&RuntimeActionModel) + 'a) -> Self {
        self.defer_ui_action = Some(Box::new(f));
        self
    }
}

// ── ActionResult ──────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Success,
    Skipped,
    Deferred,
    Failed,
}

/// Outcome of one runtime action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub document_changed: bool,
    pub param_changed: bool,
    pub blocked_by_thread_policy: bool,
    pub message: String,
}

impl ActionResult {
    fn with_status(status: ActionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            document_changed: false,
            param_changed: false,
            blocked_by_thread_policy: false,
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::with_status(ActionStatus::Success, "")
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self::with_status(ActionStatus::Skipped, message)
    }

    pub fn deferred(message: impl Into<String>) -> Self {
        Self::with_status(ActionStatus::Deferred, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::with_status(ActionStatus::Failed, message)
    }

    pub fn is_failure(&self) -> bool {
        self.status == ActionStatus::Failed
    }
}

// ── Executors ─────────────────────────────────────────────────────────────

/// Runs one runtime action against a document and a context.
pub trait ActionExecutor {
    fn execute(
        &self,
        action: &RuntimeActionModel,
        payload: Option<&RuntimeValue>,
        document: &mut DocumentModel,
        ctx: &mut ExecutorContext<'_>,
    ) -> ActionResult;
}

/// The stock executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeActionExecutor;

impl ActionExecutor for RuntimeActionExecutor {
    fn execute(
        &self,
        action: &RuntimeActionModel,
        payload: Option<&RuntimeValue>,
        document: &mut DocumentModel,
        ctx: &mut ExecutorContext<'_>,
    ) -> ActionResult {
        if action.is_ui_affecting() && !ctx.dispatch_thread.is_ui() {
            return defer_or_block(action, ctx);
        }

        match action {
            RuntimeActionModel::SetRuntimeParam { key, value } => {
                param_result(ctx.params.set(key, value.as_ref(), payload))
            }
            RuntimeActionModel::AdjustRuntimeParam { key, delta } => {
                param_result(ctx.params.adjust(key, *delta))
            }
            RuntimeActionModel::ToggleRuntimeParam { key } => param_result(ctx.params.toggle(key)),
            RuntimeActionModel::SetNodeProps { target, visible, locked, opacity, patch } => {
                match props_action(*target, *visible, *locked, *opacity, patch) {
                    Ok(doc_action) => run_hook(ctx.apply_set_props.as_mut(), document, &doc_action, "setProps"),
                    Err(msg) => ActionResult::failed(msg),
                }
            }
            RuntimeActionModel::SetNodeBounds { target_widget_id, bounds } => {
                let doc_action: Action = SetBoundsAction::single(*target_widget_id, *bounds).into();
                run_hook(ctx.apply_set_bounds.as_mut(), document, &doc_action, "setBounds")
            }
            RuntimeActionModel::Unknown => ActionResult::skipped("unknown runtime action kind"),
        }
    }
}

fn defer_or_block(action: &RuntimeActionModel, ctx: &mut ExecutorContext<'_>) -> ActionResult {
    let thread = ctx.dispatch_thread.as_str();
    match ctx.defer_ui_action.as_mut() {
        Some(defer) => {
            defer(action);
            log::debug!("deferred {} from {thread} thread to the ui thread", action.kind_name());
            ActionResult::deferred(format!("{} deferred to the ui thread", action.kind_name()))
        }
        None => {
            log::debug!("blocked {} on {thread} thread", action.kind_name());
            let mut result = ActionResult::failed(format!(
                "{} must run on the ui thread (dispatched on {thread})",
                action.kind_name()
            ));
            result.blocked_by_thread_policy = true;
            result
        }
    }
}

fn param_result(outcome: Result<bool, ParamError>) -> ActionResult {
    match outcome {
        Ok(changed) => {
            let mut result = ActionResult::success();
            result.param_changed = changed;
            result
        }
        Err(e) => ActionResult::failed(e.to_string()),
    }
}

/// Builds the single-target SetProps action for a runtime `setNodeProps`.
fn props_action(
    target: NodeRef,
    visible: Option<bool>,
    locked: Option<bool>,
    opacity: Option<f32>,
    patch: &PropertyBag,
) -> Result<Action, String> {
    if target.kind != NodeKind::Widget && !patch.is_empty() {
        return Err(format!("property patches only apply to widgets, not a {}", target.kind));
    }
    let patch = match target.kind {
        NodeKind::Widget => PropsPatch::Widget(WidgetPropsPatch {
            visible,
            locked,
            opacity,
            bounds: None,
            properties: patch.clone(),
        }),
        NodeKind::Group => PropsPatch::Group(GroupPropsPatch { name: None, visible, locked, opacity }),
        NodeKind::Layer => {
            if opacity.is_some() {
                return Err("layers have no opacity".to_string());
            }
            PropsPatch::Layer(LayerPropsPatch { name: None, visible, locked })
        }
    };
    Ok(SetPropsAction { kind: target.kind, ids: vec![target.id], patch }.into())
}

fn run_hook(
    hook: Option<&mut DocumentHook<'_>>,
    document: &mut DocumentModel,
    action: &Action,
    name: &str,
) -> ActionResult {
    let Some(hook) = hook else {
        return ActionResult::failed(format!("no {name} hook installed"));
    };
    match hook(document, action) {
        Ok(()) => {
            let mut result = ActionResult::success();
            result.document_changed = true;
            result
        }
        Err(e) => ActionResult::failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use marduk_doc::action::CreateAction;
    use marduk_doc::coords::Rect;
    use marduk_doc::model::{PropertyValue, WidgetType};

    use super::*;

    fn doc_with_widget() -> DocumentModel {
        let mut doc = DocumentModel::new();
        marduk_doc::apply(&mut doc, &CreateAction::widget(WidgetType::Label, Rect::new(0.0, 0.0, 10.0, 10.0)).into(), None)
            .unwrap();
        doc
    }

    fn hide(id: i64) -> RuntimeActionModel {
        RuntimeActionModel::SetNodeProps {
            target: NodeRef::widget(id),
            visible: Some(false),
            locked: None,
            opacity: None,
            patch: PropertyBag::new(),
        }
    }

    // ── params ────────────────────────────────────────────────────────────

    #[test]
    fn param_actions_hit_the_bridge() {
        let mut doc = DocumentModel::new();
        let mut params = RuntimeParamBridge::new();
        let mut ctx = ExecutorContext::new(&mut params);
        let exec = RuntimeActionExecutor;

        let set = RuntimeActionModel::SetRuntimeParam { key: "gain".into(), value: None };
        let r = exec.execute(&set, Some(&RuntimeValue::Double(0.7)), &mut doc, &mut ctx);
        assert_eq!(r.status, ActionStatus::Success);
        assert!(r.param_changed);
        assert!(!r.document_changed);

        let toggle = RuntimeActionModel::ToggleRuntimeParam { key: "gain".into() };
        assert_eq!(exec.execute(&toggle, None, &mut doc, &mut ctx).status, ActionStatus::Success);
        assert_eq!(ctx.params.get("gain"), Some(&RuntimeValue::Bool(false)));

        let adjust = RuntimeActionModel::AdjustRuntimeParam { key: "gain".into(), delta: 1.0 };
        let r = exec.execute(&adjust, None, &mut doc, &mut ctx);
        assert!(r.is_failure());
        assert!(r.message.contains("type mismatch"));
    }

    #[test]
    fn param_actions_run_off_the_ui_thread() {
        let mut doc = DocumentModel::new();
        let mut params = RuntimeParamBridge::new();
        let mut ctx = ExecutorContext::new(&mut params).on_thread(RuntimeDispatchThread::RealtimeAudio);
        let r = RuntimeActionExecutor.execute(
            &RuntimeActionModel::ToggleRuntimeParam { key: "bypass".into() },
            None,
            &mut doc,
            &mut ctx,
        );
        assert_eq!(r.status, ActionStatus::Success);
    }

    // ── widget actions ────────────────────────────────────────────────────

    #[test]
    fn set_node_props_goes_through_reducer() {
        let mut doc = doc_with_widget();
        let mut params = RuntimeParamBridge::new();
        let mut ctx = ExecutorContext::with_reducer(&mut params);

        let mut patch = PropertyBag::new();
        patch.insert("text".into(), "armed".into());
        let action = RuntimeActionModel::SetNodeProps {
            target: NodeRef::widget(1),
            visible: None,
            locked: Some(true),
            opacity: None,
            patch,
        };
        let r = RuntimeActionExecutor.execute(&action, None, &mut doc, &mut ctx);
        assert_eq!(r.status, ActionStatus::Success);
        assert!(r.document_changed);
        let w = doc.widget(1).unwrap();
        assert!(w.locked);
        assert_eq!(w.properties["text"], PropertyValue::String("armed".into()));
    }

    #[test]
    fn set_node_bounds_reports_reducer_errors() {
        let mut doc = doc_with_widget();
        let mut params = RuntimeParamBridge::new();
        let mut ctx = ExecutorContext::with_reducer(&mut params);
        let action = RuntimeActionModel::SetNodeBounds {
            target_widget_id: 9,
            bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
        };
        let r = RuntimeActionExecutor.execute(&action, None, &mut doc, &mut ctx);
        assert!(r.is_failure());
        assert!(r.message.contains("not found"));
    }

    #[test]
    fn missing_hook_fails() {
        let mut doc = doc_with_widget();
        let mut params = RuntimeParamBridge::new();
        let mut ctx = ExecutorContext::new(&mut params);
        let r = RuntimeActionExecutor.execute(&hide(1), None, &mut doc, &mut ctx);
        assert!(r.is_failure());
        assert!(r.message.contains("hook"));
        assert!(doc.widget(1).unwrap().visible);
    }

    #[test]
    fn property_patch_on_group_is_rejected() {
        let mut doc = doc_with_widget();
        let mut params = RuntimeParamBridge::new();
        let mut ctx = ExecutorContext::with_reducer(&mut params);
        let mut patch = PropertyBag::new();
        patch.insert("text".into(), "x".into());
        let action = RuntimeActionModel::SetNodeProps {
            target: NodeRef::group(1),
            visible: None,
            locked: None,
            opacity: None,
            patch,
        };
        assert!(RuntimeActionExecutor.execute(&action, None, &mut doc, &mut ctx).is_failure());
    }

    // ── thread policy ─────────────────────────────────────────────────────

    #[test]
    fn off_ui_thread_without_defer_is_blocked() {
        let mut doc = doc_with_widget();
        let mut params = RuntimeParamBridge::new();
        let mut ctx = ExecutorContext::with_reducer(&mut params).on_thread(RuntimeDispatchThread::WorkerBackground);
        let r = RuntimeActionExecutor.execute(&hide(1), None, &mut doc, &mut ctx);
        assert_eq!(r.status, ActionStatus::Failed);
        assert!(r.blocked_by_thread_policy);
        assert!(doc.widget(1).unwrap().visible);
    }

    #[test]
    fn off_ui_thread_with_defer_hands_over_the_action() {
        let mut doc = doc_with_widget();
        let mut params = RuntimeParamBridge::new();
        let deferred = RefCell::new(Vec::new());
        let mut ctx = ExecutorContext::with_reducer(&mut params)
            .on_thread(RuntimeDispatchThread::RealtimeAudio)
            .defer_with(|a| deferred.borrow_mut().push(a.clone()));

        let r = RuntimeActionExecutor.execute(&hide(1), None, &mut doc, &mut ctx);
        drop(ctx);

        assert_eq!(r.status, ActionStatus::Deferred);
        assert!(!r.blocked_by_thread_policy);
        assert!(!r.document_changed);
        assert_eq!(deferred.into_inner(), vec![hide(1)]);
        assert!(doc.widget(1).unwrap().visible);
    }

    #[test]
    fn unknown_action_is_skipped() {
        let mut doc = DocumentModel::new();
        let mut params = RuntimeParamBridge::new();
        let mut ctx = ExecutorContext::new(&mut params);
        let r = RuntimeActionExecutor.execute(&RuntimeActionModel::Unknown, None, &mut doc, &mut ctx);
        assert_eq!(r.status, ActionStatus::Skipped);
    }
}
