//! Runtime side of a Marduk document: live parameters, event-driven actions,
//! and property bindings.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`params`] | `RuntimeParamBridge`, the typed parameter store |
//! | [`executor`] | `ActionExecutor`, `ExecutorContext`, thread policy |
//! | [`binding`] | `RuntimeBindingEngine`, `DispatchReport` |
//! | [`property`] | `PropertyBindingApplier` |
//! | [`diagnostics`] | rate-limited report logging |
//! | [`payload`] | JSON runtime payload |
//! | [`session`] | `RuntimeSession`, everything above behind one handle |
//! | [`logging`] | `init_logging` for binaries and tests |
//!
//! # Quick start
//!
//! ```rust
//! use marduk_doc::action::CreateAction;
//! use marduk_doc::coords::Rect;
//! use marduk_doc::model::{DocumentModel, WidgetType};
//! use marduk_runtime::payload::RuntimePayload;
//! use marduk_runtime::session::{RuntimeSession, SessionConfig};
//!
//! let mut doc = DocumentModel::new();
//! let button = CreateAction::widget(WidgetType::Button, Rect::new(0.0, 0.0, 60.0, 24.0));
//! marduk_doc::apply(&mut doc, &button.into(), None).unwrap();
//!
//! let payload = RuntimePayload::from_json_str(r#"{
//!     "runtimeBindings": [{ "id": 10, "sourceWidgetId": 1, "eventKey": "clicked",
//!                           "actions": [{ "kind": "toggleRuntimeParam", "key": "armed" }] }]
//! }"#).unwrap();
//!
//! let mut session = RuntimeSession::with_payload(doc, payload, SessionConfig::new()).unwrap();
//! let out = session.dispatch(1, "clicked", None).unwrap();
//! assert_eq!(out.report.succeeded, 1);
//! assert_eq!(session.params().get("armed").and_then(|v| v.as_bool()), Some(true));
//! ```

pub mod binding;
pub mod diagnostics;
pub mod executor;
pub mod logging;
pub mod params;
pub mod payload;
pub mod property;
pub mod session;

pub use binding::{DispatchError, DispatchOptions, DispatchReport, RuntimeBindingEngine};
pub use executor::{
    ActionExecutor,
    ActionResult,
    ActionStatus,
    ExecutorContext,
    RuntimeActionExecutor,
    RuntimeDispatchThread,
};
pub use params::{ParamError, ParamErrorKind, RuntimeParamBridge};
pub use property::{ApplyState, BindingApplyReport, PropertyBindingApplier};
pub use session::{RuntimeSession, SessionConfig};
