//! `#[repr(C)]` types shared with widget plugins.
//!
//! Every struct that crosses the boundary starts with `abi_version` and
//! `struct_size` so either side can reject a peer built against a different
//! layout before touching anything else. Strings cross as [`StrView`]s that
//! are only valid for the duration of the call that carries them.

use core::ffi::c_void;

/// Layout version of every `*V1` struct in this module.
pub const MARDUK_WIDGET_ABI_VERSION: u32 = 1;

// ── Primitives ────────────────────────────────────────────────────────────

/// Borrowed UTF-8 bytes. A null pointer with zero length is the empty string.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StrView {
    pub ptr: *const u8,
    pub len: usize,
}

impl StrView {
    pub const fn empty() -> Self {
        Self { ptr: core::ptr::null(), len: 0 }
    }

    pub const fn from_static(s: &'static str) -> Self {
        Self { ptr: s.as_ptr(), len: s.len() }
    }

    /// Views `s` for the duration of a call. The caller keeps `s` alive.
    pub fn borrowed(s: &str) -> Self {
        Self { ptr: s.as_ptr(), len: s.len() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbiRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbiSize {
    pub w: f32,
    pub h: f32,
}

/// Straight-alpha color, each channel in `[0, 1]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbiColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    Ok = 0,
    Failed = 1,
    Incompatible = 2,
    InvalidArgument = 3,
}

/// Cursor codes returned by [`WidgetDescriptorV1::cursor`].
pub const CURSOR_DEFAULT: u32 = 0;
pub const CURSOR_POINTER: u32 = 1;
pub const CURSOR_TEXT: u32 = 2;
pub const CURSOR_RESIZE_H: u32 = 3;
pub const CURSOR_RESIZE_V: u32 = 4;

/// Log levels accepted by [`HostApiV1::log`].
pub const LOG_ERROR: u32 = 1;
pub const LOG_WARN: u32 = 2;
pub const LOG_INFO: u32 = 3;
pub const LOG_DEBUG: u32 = 4;

// ── Host tables ───────────────────────────────────────────────────────────

/// Read access to a widget's property bag. `props` is opaque to the plugin.
///
/// Getters return `false` when the key is missing or holds another type.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PropertyApiV1 {
    pub get_number: unsafe extern "C" fn(props: *const c_void, key: StrView, out: *mut f64) -> bool,
    pub get_bool: unsafe extern "C" fn(props: *const c_void, key: StrView, out: *mut bool) -> bool,
    /// The returned view lives as long as the call that handed out `props`.
    pub get_string: unsafe extern "C" fn(props: *const c_void, key: StrView, out: *mut StrView) -> bool,
}

/// Write access to a property patch being assembled by the host.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PatchApiV1 {
    pub set_number: unsafe extern "C" fn(patch: *mut c_void, key: StrView, value: f64) -> PluginStatus,
    pub set_bool: unsafe extern "C" fn(patch: *mut c_void, key: StrView, value: bool) -> PluginStatus,
    pub set_string: unsafe extern "C" fn(patch: *mut c_void, key: StrView, value: StrView) -> PluginStatus,
}

/// Drawing primitives available inside [`WidgetDescriptorV1::paint`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DrawApiV1 {
    pub fill_rect: unsafe extern "C" fn(ctx: *mut c_void, rect: AbiRect, color: AbiColor),
    pub stroke_rect: unsafe extern "C" fn(ctx: *mut c_void, rect: AbiRect, color: AbiColor, width: f32),
    pub text: unsafe extern "C" fn(ctx: *mut c_void, rect: AbiRect, text: StrView, color: AbiColor),
}

/// Everything the host offers a plugin.
#[repr(C)]
pub struct HostApiV1 {
    pub abi_version: u32,
    pub struct_size: u32,
    /// Opaque; passed back to `register_widget`.
    pub host_ctx: *mut c_void,
    /// Copies the descriptor; it need not outlive the call.
    pub register_widget: unsafe extern "C" fn(host_ctx: *mut c_void, desc: *const WidgetDescriptorV1) -> PluginStatus,
    pub log: unsafe extern "C" fn(level: u32, msg: StrView),
    pub props: PropertyApiV1,
    pub patch: PatchApiV1,
    pub draw: *const DrawApiV1,
}

/// Plugin entry point. Registers widgets through `host.register_widget`.
pub type WidgetPluginEntryV1 = unsafe extern "C" fn(host: *const HostApiV1) -> PluginStatus;

// ── Widget descriptor ─────────────────────────────────────────────────────

pub type PaintFn = unsafe extern "C" fn(
    host: *const HostApiV1,
    draw_ctx: *mut c_void,
    props: *const c_void,
    bounds: AbiRect,
) -> PluginStatus;

pub type HitTestFn = unsafe extern "C" fn(props: *const c_void, bounds: AbiRect, x: f32, y: f32) -> bool;

pub type CursorFn = unsafe extern "C" fn(props: *const c_void, bounds: AbiRect, x: f32, y: f32) -> u32;

pub type InteractionFn = unsafe extern "C" fn(
    host: *const HostApiV1,
    props: *const c_void,
    patch: *mut c_void,
    event: StrView,
    x: f32,
    y: f32,
) -> PluginStatus;

/// Asset dropped onto the widget; `asset_ref` is the asset's reference key.
pub type DropFn = unsafe extern "C" fn(
    host: *const HostApiV1,
    props: *const c_void,
    patch: *mut c_void,
    asset_ref: StrView,
) -> PluginStatus;

/// Receives generated code: two JSON arrays of strings, one with constructor
/// lines and one with resize lines.
pub type CodegenEmitFn = unsafe extern "C" fn(sink: *mut c_void, constructor_json: StrView, resize_json: StrView) -> PluginStatus;

pub type ExportCodegenFn = unsafe extern "C" fn(
    host: *const HostApiV1,
    props: *const c_void,
    sink: *mut c_void,
    emit: CodegenEmitFn,
) -> PluginStatus;

/// One plugin-provided widget type.
#[repr(C)]
pub struct WidgetDescriptorV1 {
    pub abi_version: u32,
    pub struct_size: u32,
    /// Stable identifier, e.g. `"acme.vu_meter"`.
    pub type_key: StrView,
    pub display_name: StrView,
    pub default_bounds: AbiRect,
    pub min_size: AbiSize,
    /// JSON object of initial properties; empty for none.
    pub default_properties_json: StrView,
    pub paint: Option<PaintFn>,
    pub hit_test: Option<HitTestFn>,
    pub cursor: Option<CursorFn>,
    pub interaction: Option<InteractionFn>,
    pub drop: Option<DropFn>,
    pub export_codegen: Option<ExportCodegenFn>,
}

impl WidgetDescriptorV1 {
    /// A descriptor header for the current layout with no callbacks.
    pub const fn new(type_key: StrView, display_name: StrView) -> Self {
        Self {
            abi_version: MARDUK_WIDGET_ABI_VERSION,
            struct_size: core::mem::size_of::<WidgetDescriptorV1>() as u32,
            type_key,
            display_name,
            default_bounds: AbiRect { x: 0.0, y: 0.0, w: 80.0, h: 24.0 },
            min_size: AbiSize { w: 0.0, h: 0.0 },
            default_properties_json: StrView::empty(),
            paint: None,
            hit_test: None,
            cursor: None,
            interaction: None,
            drop: None,
            export_codegen: None,
        }
    }
}
