//! Document model, actions, and reducer for the **Marduk GUI builder**.
//!
//! A builder project is one [`DocumentModel`]: root-level widgets in canvas
//! order, groups, layers, assets, and the runtime data (parameters, property
//! bindings, event bindings) that drives the generated UI at run time.
//!
//! The document is plain data. Every edit is described as an [`Action`] and
//! goes through [`apply`], which validates it, checks it against the
//! document, and then mutates in place. A rejected action leaves the document
//! untouched.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`coords`] | `Vec2`, `Rect` |
//! | [`color`] | `Rgba`, `Hsla` |
//! | [`model`] | `DocumentModel` and everything it holds |
//! | [`action`] | `Action` variants and `validate_action` |
//! | [`reducer`] | `apply` |
//! | [`error`] | `DocError` |
//!
//! # Quick start
//!
//! ```rust
//! use marduk_doc::action::{CreateAction, DeleteAction};
//! use marduk_doc::coords::Rect;
//! use marduk_doc::model::{DocumentModel, WidgetType};
//!
//! let mut doc = DocumentModel::new();
//! let mut created = Vec::new();
//! let action = CreateAction::widget(WidgetType::Knob, Rect::new(10.0, 10.0, 48.0, 48.0));
//! marduk_doc::apply(&mut doc, &action.into(), Some(&mut created)).unwrap();
//! assert_eq!(created, vec![1]);
//!
//! marduk_doc::apply(&mut doc, &DeleteAction::widgets(created).into(), None).unwrap();
//! assert!(doc.widgets.is_empty());
//! ```

pub mod action;
pub mod color;
pub mod coords;
pub mod error;
pub mod model;
pub mod reducer;

pub use action::{validate_action, Action};
pub use error::DocError;
pub use model::DocumentModel;
pub use reducer::apply;
