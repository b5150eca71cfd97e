//! The typed, serializable document state. Pure data; all behavior lives in
//! [`crate::action`] and [`crate::reducer`].

mod asset;
mod document;
mod group;
mod id;
mod runtime;
mod value;
mod widget;

pub use asset::{AssetKind, AssetModel};
pub use document::{DocumentModel, SchemaVersion};
pub use group::{GroupModel, LayerModel};
pub use id::{NodeKind, NodeRef, WidgetId, ROOT_ID};
pub use runtime::{
    PropertyBindingModel,
    RuntimeActionModel,
    RuntimeBindingModel,
    RuntimeParamModel,
    RuntimeParamType,
    RuntimeValue,
};
pub use value::{PropertyBag, PropertyValue, RESERVED_BOUNDS_KEY};
pub use widget::{WidgetModel, WidgetType};
