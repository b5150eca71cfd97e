//! Event dispatch: from a widget event to a queue of executed runtime actions.

use marduk_doc::model::{DocumentModel, RuntimeActionModel, RuntimeValue, WidgetId, ROOT_ID};
use thiserror::Error;

use crate::executor::{ActionExecutor, ActionStatus, ExecutorContext};

// ── Options ───────────────────────────────────────────────────────────────

/// Per-engine dispatch limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Actions executed per event. Never below 1.
    pub max_actions_per_event: usize,
    /// Keep executing after a failed action.
    pub continue_on_action_failure: bool,
}

impl DispatchOptions {
    pub const DEFAULT_MAX_ACTIONS: usize = 128;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_actions(mut self, n: usize) -> Self {
        self.max_actions_per_event = n.max(1);
        self
    }

    pub fn continue_on_failure(mut self, yes: bool) -> Self {
        self.continue_on_action_failure = yes;
        self
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_actions_per_event: Self::DEFAULT_MAX_ACTIONS,
            continue_on_action_failure: true,
        }
    }
}

// ── Report ────────────────────────────────────────────────────────────────

/// What one dispatched event did.
///
/// Every queued action ends up counted exactly once in `executed_actions`
/// or `skipped`. Executed actions are further split into `succeeded`,
/// `failed`, `deferred`, and executor-side skips (also counted in `skipped`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub source_id: WidgetId,
    pub event_key: String,
    pub matched_bindings: usize,
    pub queued_actions: usize,
    pub executed_actions: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub deferred: usize,
    pub document_changed: bool,
    pub params_changed: bool,
    pub action_limit_hit: bool,
    pub blocked_by_thread_policy: bool,
    pub notes: Vec<String>,
}

impl DispatchReport {
    /// No binding matched the event.
    pub fn is_empty(&self) -> bool {
        self.matched_bindings == 0
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("event source id {0} is not a valid widget id")]
    InvalidSource(WidgetId),
    #[error("event key must not be blank")]
    BlankEventKey,
}

// ── Engine ────────────────────────────────────────────────────────────────

/// Matches runtime bindings against widget events and runs their actions.
#[derive(Debug, Clone, Default)]
pub struct RuntimeBindingEngine {
    options: DispatchOptions,
}

impl RuntimeBindingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DispatchOptions) -> Self {
        let mut engine = Self::new();
        engine.set_options(options);
        engine
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    pub fn set_options(&mut self, options: DispatchOptions) {
        self.options = options.max_actions(options.max_actions_per_event);
    }

    /// Runs every action bound to `(source_id, event_key)`.
    ///
    /// Bindings match when enabled, sourced from `source_id`, and their
    /// trimmed event key equals the trimmed `event_key` (case-sensitive).
    /// Actions run in binding order, then action order. `payload` is the
    /// event value handed to `setRuntimeParam` actions without a value.
    pub fn dispatch_event<E: ActionExecutor + ?Sized>(
        &self,
        document: &mut DocumentModel,
        source_id: WidgetId,
        event_key: &str,
        payload: Option<&RuntimeValue>,
        executor: &E,
        ctx: &mut ExecutorContext<'_>,
    ) -> Result<DispatchReport, DispatchError> {
        if source_id <= ROOT_ID {
            return Err(DispatchError::InvalidSource(source_id));
        }
        let event_key = event_key.trim();
        if event_key.is_empty() {
            return Err(DispatchError::BlankEventKey);
        }

        let mut report = DispatchReport {
            source_id,
            event_key: event_key.to_string(),
            ..Default::default()
        };

        // Owned copy: executing actions mutates the document the bindings live in.
        let mut queue: Vec<RuntimeActionModel> = Vec::new();
        for binding in document.runtime_bindings.iter().filter(|b| {
            b.enabled && b.source_widget_id == source_id && b.event_key.trim() == event_key
        }) {
            report.matched_bindings += 1;
            queue.extend(binding.actions.iter().cloned());
        }
        report.queued_actions = queue.len();

        if queue.is_empty() {
            log::trace!("event {event_key} on widget {source_id}: no runtime actions");
            return Ok(report);
        }

        let limit = self.options.max_actions_per_event.max(1);
        for (index, action) in queue.iter().enumerate() {
            if index >= limit {
                let overflow = queue.len() - index;
                report.skipped += overflow;
                report.action_limit_hit = true;
                report.notes.push(format!(
                    "action limit of {limit} reached; {overflow} action(s) not executed"
                ));
                break;
            }

            let result = executor.execute(action, payload, document, ctx);
            report.executed_actions += 1;
            report.document_changed |= result.document_changed;
            report.params_changed |= result.param_changed;
            report.blocked_by_thread_policy |= result.blocked_by_thread_policy;

            match result.status {
                ActionStatus::Success => report.succeeded += 1,
                ActionStatus::Deferred => report.deferred += 1,
                ActionStatus::Skipped => {
                    report.skipped += 1;
                    report.notes.push(format!("action {index} ({}) skipped: {}", action.kind_name(), result.message));
                }
                ActionStatus::Failed => {
                    report.failed += 1;
                    report.notes.push(format!("action {index} ({}) failed: {}", action.kind_name(), result.message));
                    if !self.options.continue_on_action_failure {
                        let remaining = queue.len() - index - 1;
                        report.skipped += remaining;
                        report.notes.push(format!(
                            "dispatch stopped after a failure; {remaining} remaining action(s) skipped"
                        ));
                        break;
                    }
                }
            }
        }

        log::debug!(
            "event {event_key} on widget {source_id}: {} binding(s), {}/{} action(s) ok, {} failed, {} skipped, {} deferred",
            report.matched_bindings,
            report.succeeded,
            report.queued_actions,
            report.failed,
            report.skipped,
            report.deferred,
        );
        Ok(report)
    }
}
