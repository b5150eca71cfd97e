//! One owner for a document and everything that runs it.
//!
//! [`RuntimeSession`] wires the bridge, binding engine, property applier and
//! diagnostics together so an embedder only forwards widget events:
//!
//! ```text
//! dispatch(source, event) ─► binding engine ─► executor ─► bridge / reducer
//!                                                  │
//!                     bridge revision moved? ◄─────┘
//!                                │ yes
//!                                ▼
//!                     property bindings re-applied
//! ```
//!
//! Property bindings write widget properties, so they are only re-applied
//! on the UI thread. A dispatch labelled with another thread leaves them
//! pending until [`RuntimeSession::run_deferred`].

use marduk_doc::model::{DocumentModel, RuntimeActionModel, RuntimeValue, WidgetId};
use marduk_doc::{Action, DocError};
use thiserror::Error;

use crate::binding::{DispatchError, DispatchOptions, DispatchReport, RuntimeBindingEngine};
use crate::diagnostics::{DiagnosticsConfig, RuntimeDiagnostics};
use crate::executor::{ActionExecutor, ActionResult, ExecutorContext, RuntimeActionExecutor, RuntimeDispatchThread};
use crate::params::{ParamError, RuntimeParamBridge};
use crate::payload::{PayloadError, RuntimePayload};
use crate::property::{BindingApplyReport, PropertyBindingApplier};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Document(#[from] DocError),
}

// ── Config ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub dispatch: DispatchOptions,
    pub diagnostics: DiagnosticsConfig,
    pub dispatch_thread: RuntimeDispatchThread,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(mut self, options: DispatchOptions) -> Self {
        self.dispatch = options;
        self
    }

    pub fn diagnostics(mut self, config: DiagnosticsConfig) -> Self {
        self.diagnostics = config;
        self
    }

    pub fn thread(mut self, thread: RuntimeDispatchThread) -> Self {
        self.dispatch_thread = thread;
        self
    }
}

/// Result of [`RuntimeSession::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDispatch {
    pub report: DispatchReport,
    /// Present when the event changed a runtime parameter and bindings were
    /// re-applied on the spot.
    pub bindings: Option<BindingApplyReport>,
    /// Parameters moved off the UI thread; bindings wait for `run_deferred`.
    pub bindings_deferred: bool,
}

// ── Session ───────────────────────────────────────────────────────────────

pub struct RuntimeSession {
    document: DocumentModel,
    params: RuntimeParamBridge,
    engine: RuntimeBindingEngine,
    applier: PropertyBindingApplier,
    diagnostics: RuntimeDiagnostics,
    executor: Box<dyn ActionExecutor>,
    dispatch_thread: RuntimeDispatchThread,
    deferred: Vec<RuntimeActionModel>,
    applied_revision: u64,
}

impl RuntimeSession {
    /// Seeds parameter defaults from `document` and applies property
    /// bindings once.
    pub fn new(document: DocumentModel, config: SessionConfig) -> Result<Self, SessionError> {
        let mut params = RuntimeParamBridge::new();
        params.seed_defaults(&document.runtime_params)?;

        let mut session = Self {
            document,
            params,
            engine: RuntimeBindingEngine::with_options(config.dispatch),
            applier: PropertyBindingApplier::new(),
            diagnostics: RuntimeDiagnostics::new(config.diagnostics),
            executor: Box::new(RuntimeActionExecutor),
            dispatch_thread: config.dispatch_thread,
            deferred: Vec::new(),
            applied_revision: 0,
        };
        session.refresh_bindings();
        Ok(session)
    }

    /// Installs `payload` into `document` before starting the session.
    pub fn with_payload(
        mut document: DocumentModel,
        payload: RuntimePayload,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        payload.validate()?;
        payload.install(&mut document);
        Self::new(document, config)
    }

    /// Replaces the stock executor.
    pub fn with_executor(mut self, executor: impl ActionExecutor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    pub fn document(&self) -> &DocumentModel {
        &self.document
    }

    pub fn into_document(self) -> DocumentModel {
        self.document
    }

    pub fn params(&self) -> &RuntimeParamBridge {
        &self.params
    }

    pub fn dispatch_thread(&self) -> RuntimeDispatchThread {
        self.dispatch_thread
    }

    pub fn set_dispatch_thread(&mut self, thread: RuntimeDispatchThread) {
        self.dispatch_thread = thread;
    }

    /// Actions deferred to the UI thread and not yet run.
    pub fn pending_deferred(&self) -> &[RuntimeActionModel] {
        &self.deferred
    }

    /// Applies a structural edit, then re-applies property bindings so new
    /// or moved widgets pick up their bound values.
    pub fn apply(&mut self, action: &Action) -> Result<Vec<WidgetId>, SessionError> {
        let mut created = Vec::new();
        marduk_doc::apply(&mut self.document, action, Some(&mut created))?;
        self.refresh_bindings();
        Ok(created)
    }

    /// Whether parameters changed since bindings were last applied.
    pub fn bindings_pending(&self) -> bool {
        self.params.revision() != self.applied_revision
    }

    /// Writes one parameter directly, as a host automation change would.
    ///
    /// Off the UI thread the binding pass is left pending.
    pub fn set_param(&mut self, key: &str, value: RuntimeValue) -> Result<Option<BindingApplyReport>, SessionError> {
        self.params.set(key, Some(&value), None)?;
        Ok(self.refresh_on_ui_thread())
    }

    /// Forwards a widget event through the binding engine.
    pub fn dispatch(
        &mut self,
        source_id: WidgetId,
        event_key: &str,
        payload: Option<&RuntimeValue>,
    ) -> Result<SessionDispatch, SessionError> {
        let deferred = &mut self.deferred;
        let mut ctx = ExecutorContext::with_reducer(&mut self.params)
            .on_thread(self.dispatch_thread)
            .defer_with(|action| deferred.push(action.clone()));

        let report = self.engine.dispatch_event(
            &mut self.document,
            source_id,
            event_key,
            payload,
            self.executor.as_ref(),
            &mut ctx,
        );
        drop(ctx);
        let report = report?;

        self.diagnostics.record(&report);
        let bindings = self.refresh_on_ui_thread();
        let bindings_deferred = bindings.is_none() && self.bindings_pending();
        Ok(SessionDispatch { report, bindings, bindings_deferred })
    }

    /// Runs every deferred action on the UI thread, in the order deferred,
    /// then re-applies bindings left pending by off-thread dispatches.
    pub fn run_deferred(&mut self) -> Vec<ActionResult> {
        let pending = std::mem::take(&mut self.deferred);
        if pending.is_empty() {
            self.refresh_if_params_moved();
            return Vec::new();
        }

        let mut ctx = ExecutorContext::with_reducer(&mut self.params);
        let results: Vec<ActionResult> = pending
            .iter()
            .map(|action| self.executor.execute(action, None, &mut self.document, &mut ctx))
            .collect();
        drop(ctx);

        let failed = results.iter().filter(|r| r.is_failure()).count();
        log::debug!("ran {} deferred action(s), {failed} failed", results.len());
        self.refresh_if_params_moved();
        results
    }

    /// Evaluates every property binding against the current parameters.
    pub fn refresh_bindings(&mut self) -> BindingApplyReport {
        let report = self.applier.apply_all(&mut self.document, &self.params);
        self.applied_revision = self.params.revision();
        self.diagnostics.record_apply(&report);
        report
    }

    fn refresh_if_params_moved(&mut self) -> Option<BindingApplyReport> {
        if !self.bindings_pending() {
            return None;
        }
        Some(self.refresh_bindings())
    }

    fn refresh_on_ui_thread(&mut self) -> Option<BindingApplyReport> {
        if !self.dispatch_thread.is_ui() {
            if self.bindings_pending() {
                log::trace!("binding pass pending until the UI thread runs deferred work");
            }
            return None;
        }
        self.refresh_if_params_moved()
    }
}

#[cfg(test)]
mod tests {
    use marduk_doc::action::CreateAction;
    use marduk_doc::coords::Rect;
    use marduk_doc::model::{NodeRef, PropertyBag, PropertyValue, RuntimeBindingModel, WidgetType};

    use super::*;

    fn base_doc() -> DocumentModel {
        let mut doc = DocumentModel::new();
        for t in [WidgetType::Meter, WidgetType::Button] {
            marduk_doc::apply(&mut doc, &CreateAction::widget(t, Rect::new(0.0, 0.0, 50.0, 20.0)).into(), None).unwrap();
        }
        doc
    }

    const PAYLOAD: &str = r#"{
        "runtimeParams": [{ "key": "level", "type": "number", "defaultValue": 2 }],
        "propertyBindings": [{ "id": 20, "targetWidgetId": 1, "targetProperty": "value", "expression": "level * 0.5" }],
        "runtimeBindings": [{ "id": 30, "sourceWidgetId": 2, "eventKey": "clicked", "actions": [
            { "kind": "adjustRuntimeParam", "key": "level", "delta": 2 }
        ] }]
    }"#;

    fn session() -> RuntimeSession {
        let payload = RuntimePayload::from_json_str(PAYLOAD).unwrap();
        RuntimeSession::with_payload(base_doc(), payload, SessionConfig::new()).unwrap()
    }

    fn meter_value(s: &RuntimeSession) -> PropertyValue {
        s.document().widget(1).unwrap().properties["value"].clone()
    }

    #[test]
    fn defaults_are_applied_on_start() {
        let s = session();
        assert_eq!(s.params().get("level"), Some(&RuntimeValue::Int(2)));
        assert_eq!(meter_value(&s), PropertyValue::Double(1.0));
    }

    #[test]
    fn dispatch_reapplies_bindings_when_params_move() {
        let mut s = session();
        let out = s.dispatch(2, "clicked", None).unwrap();
        assert_eq!(out.report.succeeded, 1);
        assert!(out.report.params_changed);
        assert_eq!(out.bindings.unwrap().applied, 1);
        assert_eq!(meter_value(&s), PropertyValue::Double(2.0));

        let none = s.dispatch(1, "clicked", None).unwrap();
        assert!(none.report.is_empty());
        assert!(none.bindings.is_none());
    }

    #[test]
    fn set_param_refreshes() {
        let mut s = session();
        assert!(s.set_param("level", RuntimeValue::Double(10.0)).unwrap().is_some());
        assert_eq!(meter_value(&s), PropertyValue::Double(5.0));
        assert!(s.set_param("level", RuntimeValue::Double(10.0)).unwrap().is_none());
    }

    #[test]
    fn deferred_actions_run_later_on_the_ui_thread() {
        let mut doc = base_doc();
        doc.runtime_bindings.push(RuntimeBindingModel {
            id: 40,
            name: "hide meter".into(),
            enabled: true,
            source_widget_id: 2,
            event_key: "clicked".into(),
            actions: vec![RuntimeActionModel::SetNodeProps {
                target: NodeRef::widget(1),
                visible: Some(false),
                locked: None,
                opacity: None,
                patch: PropertyBag::new(),
            }],
        });
        let config = SessionConfig::new().thread(RuntimeDispatchThread::WorkerBackground);
        let mut s = RuntimeSession::new(doc, config).unwrap();

        let out = s.dispatch(2, "clicked", None).unwrap();
        assert_eq!(out.report.deferred, 1);
        assert_eq!(s.pending_deferred().len(), 1);
        assert!(s.document().widget(1).unwrap().visible);

        let results = s.run_deferred();
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_failure());
        assert!(!s.document().widget(1).unwrap().visible);
        assert!(s.pending_deferred().is_empty());
    }

    #[test]
    fn audio_thread_leaves_bindings_for_the_ui_thread() {
        let payload = RuntimePayload::from_json_str(PAYLOAD).unwrap();
        let config = SessionConfig::new().thread(RuntimeDispatchThread::RealtimeAudio);
        let mut s = RuntimeSession::with_payload(base_doc(), payload, config).unwrap();

        let out = s.dispatch(2, "clicked", None).unwrap();
        assert!(out.report.params_changed);
        assert!(out.bindings.is_none());
        assert!(out.bindings_deferred);
        assert!(s.bindings_pending());
        assert_eq!(s.params().get("level"), Some(&RuntimeValue::Int(4)));
        assert_eq!(meter_value(&s), PropertyValue::Double(1.0));

        assert!(s.set_param("level", RuntimeValue::Double(6.0)).unwrap().is_none());
        assert_eq!(meter_value(&s), PropertyValue::Double(1.0));

        s.set_dispatch_thread(RuntimeDispatchThread::UiMessage);
        assert!(s.run_deferred().is_empty());
        assert!(!s.bindings_pending());
        assert_eq!(meter_value(&s), PropertyValue::Double(3.0));
    }

    #[test]
    fn structural_edits_pick_up_bindings() {
        let payload = RuntimePayload::from_json_str(
            r#"{ "propertyBindings": [{ "id": 20, "targetWidgetId": 3, "targetProperty": "opacity", "expression": "0.25" }] }"#,
        )
        .unwrap();
        let mut s = RuntimeSession::with_payload(base_doc(), payload, SessionConfig::new()).unwrap();
        let created = s.apply(&CreateAction::widget(WidgetType::Knob, Rect::new(0.0, 0.0, 10.0, 10.0)).into()).unwrap();
        assert_eq!(created, vec![3]);
        assert_eq!(s.document().widget(3).unwrap().opacity, 0.25);
    }

    #[test]
    fn bad_dispatch_arguments_surface() {
        let mut s = session();
        assert!(matches!(s.dispatch(0, "clicked", None), Err(SessionError::Dispatch(_))));
    }
}
