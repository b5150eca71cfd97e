//! Widget types contributed by plugins.
//!
//! A [`PluginRegistry`] copies every accepted descriptor into an owned
//! [`RegisteredWidget`]. Only the callback pointers keep referring to plugin
//! code, so the registry must not outlive the code it was loaded from.

use core::ffi::c_void;
use std::collections::BTreeMap;
use std::ptr;

use marduk_doc::action::validate_property_bag;
use marduk_doc::coords::{Rect, Vec2};
use marduk_doc::model::PropertyBag;

use crate::abi::{
    CursorFn,
    DropFn,
    ExportCodegenFn,
    HitTestFn,
    InteractionFn,
    PaintFn,
    PluginStatus,
    StrView,
    WidgetDescriptorV1,
    WidgetPluginEntryV1,
    CURSOR_POINTER,
    CURSOR_RESIZE_H,
    CURSOR_RESIZE_V,
    CURSOR_TEXT,
    MARDUK_WIDGET_ABI_VERSION,
};
use crate::error::PluginError;
use crate::host::{host_api, props_ptr, view_to_str, view_to_string, PaintTarget, WidgetPainter};

/// Mouse cursor a plugin widget asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Text,
    ResizeHorizontal,
    ResizeVertical,
}

impl Cursor {
    /// Unknown codes fall back to [`Cursor::Default`].
    pub fn from_code(code: u32) -> Self {
        match code {
            CURSOR_POINTER => Cursor::Pointer,
            CURSOR_TEXT => Cursor::Text,
            CURSOR_RESIZE_H => Cursor::ResizeHorizontal,
            CURSOR_RESIZE_V => Cursor::ResizeVertical,
            _ => Cursor::Default,
        }
    }
}

/// Code a plugin generated for one widget instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedCode {
    pub constructor_lines: Vec<String>,
    pub resize_lines: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Callbacks {
    paint: Option<PaintFn>,
    hit_test: Option<HitTestFn>,
    cursor: Option<CursorFn>,
    interaction: Option<InteractionFn>,
    drop: Option<DropFn>,
    export_codegen: Option<ExportCodegenFn>,
}

fn check(callback: &'static str, status: PluginStatus) -> Result<(), PluginError> {
    match status {
        PluginStatus::Ok => Ok(()),
        status => Err(PluginError::CallbackFailed { callback, status }),
    }
}

// ── RegisteredWidget ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RegisteredWidget {
    pub type_key: String,
    pub display_name: String,
    pub default_bounds: Rect,
    pub min_size: Vec2,
    pub default_properties: PropertyBag,
    callbacks: Callbacks,
}

impl RegisteredWidget {
    /// Runs the plugin's paint callback. Returns `false` when the plugin
    /// does not paint, so the host can draw a placeholder.
    pub fn paint(&self, bounds: Rect, props: &PropertyBag, painter: &mut dyn WidgetPainter) -> Result<bool, PluginError> {
        let Some(paint) = self.callbacks.paint else { return Ok(false) };
        let host = host_api(ptr::null_mut());
        let mut target = PaintTarget { painter };
        let draw_ctx = ptr::from_mut(&mut target).cast::<c_void>();
        let status = unsafe { paint(&host, draw_ctx, props_ptr(props), bounds.into()) };
        check("paint", status)?;
        Ok(true)
    }

    /// Plugin hit test, or a plain bounds check when the plugin has none.
    pub fn hit_test(&self, bounds: Rect, props: &PropertyBag, point: Vec2) -> bool {
        match self.callbacks.hit_test {
            Some(hit) => unsafe { hit(props_ptr(props), bounds.into(), point.x, point.y) },
            None => bounds.contains(point),
        }
    }

    pub fn cursor(&self, bounds: Rect, props: &PropertyBag, point: Vec2) -> Cursor {
        match self.callbacks.cursor {
            Some(cursor) => Cursor::from_code(unsafe { cursor(props_ptr(props), bounds.into(), point.x, point.y) }),
            None => Cursor::Default,
        }
    }

    /// Forwards a pointer event and returns the property patch the plugin
    /// wrote. The patch passes the same checks as a `SetProps` action.
    pub fn interact(&self, props: &PropertyBag, event: &str, point: Vec2) -> Result<PropertyBag, PluginError> {
        let Some(interaction) = self.callbacks.interaction else { return Ok(PropertyBag::new()) };
        let host = host_api(ptr::null_mut());
        let mut patch = PropertyBag::new();
        let status = unsafe {
            interaction(
                &host,
                props_ptr(props),
                ptr::from_mut(&mut patch).cast(),
                StrView::borrowed(event),
                point.x,
                point.y,
            )
        };
        check("interaction", status)?;
        validate_property_bag(&patch)?;
        Ok(patch)
    }

    /// Asks the plugin what to change when an asset is dropped on the widget.
    pub fn drop_asset(&self, props: &PropertyBag, asset_ref: &str) -> Result<PropertyBag, PluginError> {
        let Some(on_drop) = self.callbacks.drop else { return Ok(PropertyBag::new()) };
        let host = host_api(ptr::null_mut());
        let mut patch = PropertyBag::new();
        let status = unsafe {
            on_drop(&host, props_ptr(props), ptr::from_mut(&mut patch).cast(), StrView::borrowed(asset_ref))
        };
        check("drop", status)?;
        validate_property_bag(&patch)?;
        Ok(patch)
    }

    /// Plugin-generated code for one instance.
    ///
    /// `None` when the plugin has no codegen callback or emitted nothing; the
    /// caller then falls back to its built-in generator.
    pub fn export_code(&self, props: &PropertyBag) -> Result<Option<ExportedCode>, PluginError> {
        let Some(export) = self.callbacks.export_codegen else { return Ok(None) };
        let host = host_api(ptr::null_mut());
        let mut sink = CodegenSink::default();
        let status = unsafe { export(&host, props_ptr(props), ptr::from_mut(&mut sink).cast(), codegen_emit) };
        if let Some(e) = sink.error {
            return Err(e);
        }
        check("export_codegen", status)?;
        Ok(sink.code)
    }
}

// ── Codegen sink ──────────────────────────────────────────────────────────

#[derive(Default)]
struct CodegenSink {
    code: Option<ExportedCode>,
    error: Option<PluginError>,
}

/// # Safety
/// Same as [`view_to_str`].
unsafe fn parse_lines(view: StrView, what: &'static str) -> Result<Vec<String>, PluginError> {
    let text = unsafe { view_to_str(view, what) }?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(text)?)
}

/// Repeated calls append.
unsafe extern "C" fn codegen_emit(sink: *mut c_void, constructor_json: StrView, resize_json: StrView) -> PluginStatus {
    let Some(sink) = (unsafe { sink.cast::<CodegenSink>().as_mut() }) else {
        return PluginStatus::InvalidArgument;
    };
    let parsed = unsafe { parse_lines(constructor_json, "constructor code") }
        .and_then(|ctor| Ok((ctor, unsafe { parse_lines(resize_json, "resize code") }?)));
    match parsed {
        Ok((ctor, resize)) => {
            let code = sink.code.get_or_insert_with(ExportedCode::default);
            code.constructor_lines.extend(ctor);
            code.resize_lines.extend(resize);
            PluginStatus::Ok
        }
        Err(e) => {
            log::warn!("plugin emitted unusable code: {e}");
            sink.error.get_or_insert(e);
            PluginStatus::InvalidArgument
        }
    }
}

// ── Registry ──────────────────────────────────────────────────────────────

/// Outcome of one [`PluginRegistry::load`].
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Type keys accepted, in registration order.
    pub registered: Vec<String>,
    /// Descriptors the host refused; the rest of the plugin still loads.
    pub rejected: Vec<PluginError>,
}

#[derive(Debug, Default)]
pub struct PluginRegistry {
    widgets: BTreeMap<String, RegisteredWidget>,
    loading: Vec<String>,
    rejected: Vec<PluginError>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a plugin entry point and collects what it registers.
    ///
    /// A failing entry point unregisters everything it added before failing.
    ///
    /// # Safety
    /// `entry` must follow the ABI in [`crate::abi`], and every callback it
    /// registers must stay callable for as long as this registry is used.
    pub unsafe fn load(&mut self, entry: WidgetPluginEntryV1) -> Result<LoadReport, PluginError> {
        self.loading.clear();
        self.rejected.clear();

        let ctx: *mut PluginRegistry = self;
        let host = host_api(ctx.cast());
        let status = unsafe { entry(&host) };

        let registered = std::mem::take(&mut self.loading);
        let rejected = std::mem::take(&mut self.rejected);
        if let Err(e) = check("entry", status) {
            for key in &registered {
                self.widgets.remove(key);
            }
            log::warn!("plugin entry failed, dropped {} widget type(s): {e}", registered.len());
            return Err(e);
        }

        log::info!("plugin loaded: {} widget type(s), {} rejected", registered.len(), rejected.len());
        Ok(LoadReport { registered, rejected })
    }

    /// Validates and copies one descriptor, returning its type key.
    ///
    /// The ABI version and struct size are read before any other field.
    ///
    /// # Safety
    /// `desc` must be null or point at readable memory at least as large as
    /// its own `struct_size` claims, with string views valid for this call.
    pub unsafe fn register(&mut self, desc: *const WidgetDescriptorV1) -> Result<String, PluginError> {
        let widget = unsafe { read_descriptor(desc) }?;
        if self.widgets.contains_key(&widget.type_key) {
            return Err(PluginError::DuplicateType(widget.type_key));
        }
        let key = widget.type_key.clone();
        self.widgets.insert(key.clone(), widget);
        self.loading.push(key.clone());
        Ok(key)
    }

    pub(crate) fn note_rejection(&mut self, e: PluginError) {
        self.rejected.push(e);
    }

    pub fn get(&self, type_key: &str) -> Option<&RegisteredWidget> {
        self.widgets.get(type_key)
    }

    pub fn type_keys(&self) -> impl Iterator<Item = &str> {
        self.widgets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

fn valid_type_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// # Safety
/// See [`PluginRegistry::register`].
unsafe fn read_descriptor(desc: *const WidgetDescriptorV1) -> Result<RegisteredWidget, PluginError> {
    if desc.is_null() {
        return Err(PluginError::NullPointer("widget descriptor"));
    }
    let found = unsafe { ptr::addr_of!((*desc).abi_version).read_unaligned() };
    if found != MARDUK_WIDGET_ABI_VERSION {
        return Err(PluginError::AbiMismatch { expected: MARDUK_WIDGET_ABI_VERSION, found });
    }
    let size = unsafe { ptr::addr_of!((*desc).struct_size).read_unaligned() } as usize;
    if size < size_of::<WidgetDescriptorV1>() {
        return Err(PluginError::StructTooSmall { expected: size_of::<WidgetDescriptorV1>(), found: size });
    }
    let d = unsafe { &*desc };

    let type_key = unsafe { view_to_string(d.type_key, "type key") }?.trim().to_string();
    if !valid_type_key(&type_key) {
        return Err(PluginError::InvalidDescriptor(format!("bad type key {type_key:?}")));
    }
    let display_name = unsafe { view_to_string(d.display_name, "display name") }?;
    let display_name = match display_name.trim() {
        "" => type_key.clone(),
        name => name.to_string(),
    };

    let default_bounds = Rect::from(d.default_bounds);
    if !default_bounds.is_valid_bounds() {
        return Err(PluginError::InvalidDescriptor(format!("'{type_key}' has invalid default bounds")));
    }
    let min_size = Vec2::new(d.min_size.w, d.min_size.h);
    if !min_size.is_valid_size() {
        return Err(PluginError::InvalidDescriptor(format!("'{type_key}' has invalid min size")));
    }

    let json = unsafe { view_to_str(d.default_properties_json, "default properties") }?;
    let default_properties: PropertyBag = if json.trim().is_empty() {
        PropertyBag::new()
    } else {
        serde_json::from_str(json)?
    };
    validate_property_bag(&default_properties)?;

    Ok(RegisteredWidget {
        type_key,
        display_name,
        default_bounds,
        min_size,
        default_properties,
        callbacks: Callbacks {
            paint: d.paint,
            hit_test: d.hit_test,
            cursor: d.cursor,
            interaction: d.interaction,
            drop: d.drop,
            export_codegen: d.export_codegen,
        },
    })
}
