//! Host side of the Marduk widget plugin ABI.
//!
//! Plugins are plain C-ABI entry points. The host hands an entry point a
//! [`abi::HostApiV1`] table; the plugin calls `register_widget` once per
//! widget type with a [`abi::WidgetDescriptorV1`]. Everything in a
//! descriptor is copied before the call returns, apart from the callback
//! pointers.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`abi`] | `#[repr(C)]` structs, status codes, callback signatures |
//! | [`registry`] | `PluginRegistry`, `RegisteredWidget`, safe callback wrappers |
//! | [`host`] | `WidgetPainter` and the host callback implementations |
//! | [`error`] | `PluginError` |
//!
//! Loading shared libraries is left to the embedder; once it has resolved
//! an entry symbol it passes the function to [`PluginRegistry::load`].

pub mod abi;
pub mod error;
pub mod host;
pub mod registry;

pub use abi::{PluginStatus, StrView, WidgetDescriptorV1, WidgetPluginEntryV1, MARDUK_WIDGET_ABI_VERSION};
pub use error::PluginError;
pub use host::WidgetPainter;
pub use registry::{Cursor, ExportedCode, LoadReport, PluginRegistry, RegisteredWidget};
