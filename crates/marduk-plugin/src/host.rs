//! Host-side implementations of the callback tables in [`crate::abi`].
//!
//! Opaque pointers handed to plugins are always one of:
//!
//! | Pointer | Points at |
//! |---------|-----------|
//! | `host_ctx` | `PluginRegistry` while an entry point runs, null otherwise |
//! | `props` | `PropertyBag` (read-only) |
//! | `patch` | `PropertyBag` collecting writes |
//! | `draw_ctx` | `PaintTarget` wrapping a `WidgetPainter` |
//! | `sink` | `CodegenSink` |

use core::ffi::c_void;
use std::ptr;

use marduk_doc::color::Rgba;
use marduk_doc::coords::Rect;
use marduk_doc::model::{PropertyBag, PropertyValue};

use crate::abi::{
    AbiColor,
    AbiRect,
    DrawApiV1,
    HostApiV1,
    PatchApiV1,
    PluginStatus,
    PropertyApiV1,
    StrView,
    WidgetDescriptorV1,
    LOG_DEBUG,
    LOG_ERROR,
    LOG_INFO,
    LOG_WARN,
    MARDUK_WIDGET_ABI_VERSION,
};
use crate::error::PluginError;
use crate::registry::PluginRegistry;

/// Receives the drawing commands a plugin issues from its paint callback.
pub trait WidgetPainter {
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f32);
    fn text(&mut self, rect: Rect, text: &str, color: Rgba);
}

// ── Conversions ───────────────────────────────────────────────────────────

impl From<AbiRect> for Rect {
    fn from(r: AbiRect) -> Self {
        Rect::new(r.x, r.y, r.w, r.h)
    }
}

impl From<Rect> for AbiRect {
    fn from(r: Rect) -> Self {
        AbiRect { x: r.x(), y: r.y(), w: r.width(), h: r.height() }
    }
}

impl From<AbiColor> for Rgba {
    fn from(c: AbiColor) -> Self {
        Rgba::new(c.r, c.g, c.b, c.a)
    }
}

/// Borrows the bytes behind `view` as UTF-8.
///
/// # Safety
/// `view.ptr` must be null or valid for `view.len` bytes for `'a`.
pub(crate) unsafe fn view_to_str<'a>(view: StrView, what: &'static str) -> Result<&'a str, PluginError> {
    if view.ptr.is_null() {
        return if view.len == 0 { Ok("") } else { Err(PluginError::NullPointer(what)) };
    }
    let bytes = unsafe { std::slice::from_raw_parts(view.ptr, view.len) };
    std::str::from_utf8(bytes).map_err(|_| PluginError::InvalidUtf8(what))
}

/// Copies the bytes behind `view` into an owned string.
///
/// # Safety
/// Same as [`view_to_str`].
pub(crate) unsafe fn view_to_string(view: StrView, what: &'static str) -> Result<String, PluginError> {
    unsafe { view_to_str(view, what) }.map(str::to_owned)
}

// ── Host table ────────────────────────────────────────────────────────────

static DRAW_API: DrawApiV1 = DrawApiV1 {
    fill_rect: host_fill_rect,
    stroke_rect: host_stroke_rect,
    text: host_text,
};

/// Builds the table handed to plugin code. `host_ctx` is null outside of an
/// entry point call, which makes `register_widget` fail.
pub(crate) fn host_api(host_ctx: *mut c_void) -> HostApiV1 {
    HostApiV1 {
        abi_version: MARDUK_WIDGET_ABI_VERSION,
        struct_size: size_of::<HostApiV1>() as u32,
        host_ctx,
        register_widget: host_register_widget,
        log: host_log,
        props: PropertyApiV1 {
            get_number: host_get_number,
            get_bool: host_get_bool,
            get_string: host_get_string,
        },
        patch: PatchApiV1 {
            set_number: host_set_number,
            set_bool: host_set_bool,
            set_string: host_set_string,
        },
        draw: &DRAW_API,
    }
}

unsafe extern "C" fn host_register_widget(host_ctx: *mut c_void, desc: *const WidgetDescriptorV1) -> PluginStatus {
    if host_ctx.is_null() {
        log::warn!("plugin tried to register a widget outside of its entry point");
        return PluginStatus::Failed;
    }
    let registry = unsafe { &mut *host_ctx.cast::<PluginRegistry>() };
    match unsafe { registry.register(desc) } {
        Ok(key) => {
            log::debug!("registered plugin widget '{key}'");
            PluginStatus::Ok
        }
        Err(e) => {
            log::warn!("rejected plugin widget: {e}");
            let status = match &e {
                PluginError::AbiMismatch { .. } | PluginError::StructTooSmall { .. } => PluginStatus::Incompatible,
                _ => PluginStatus::InvalidArgument,
            };
            registry.note_rejection(e);
            status
        }
    }
}

unsafe extern "C" fn host_log(level: u32, msg: StrView) {
    let level = match level {
        LOG_ERROR => log::Level::Error,
        LOG_WARN => log::Level::Warn,
        LOG_INFO => log::Level::Info,
        LOG_DEBUG => log::Level::Debug,
        _ => log::Level::Trace,
    };
    match unsafe { view_to_str(msg, "log message") } {
        Ok(text) => log::log!(target: "marduk_plugin::guest", level, "{text}"),
        Err(e) => log::warn!("plugin log call dropped: {e}"),
    }
}

// ── Properties ────────────────────────────────────────────────────────────

/// # Safety
/// `props` must be null or point at a live `PropertyBag`; `key` as in [`view_to_str`].
unsafe fn lookup<'a>(props: *const c_void, key: StrView) -> Option<&'a PropertyValue> {
    if props.is_null() {
        return None;
    }
    let key = unsafe { view_to_str(key, "property key") }.ok()?;
    let bag = unsafe { &*props.cast::<PropertyBag>() };
    bag.get(key)
}

unsafe extern "C" fn host_get_number(props: *const c_void, key: StrView, out: *mut f64) -> bool {
    if out.is_null() {
        return false;
    }
    match unsafe { lookup(props, key) }.and_then(PropertyValue::as_f64) {
        Some(v) => {
            unsafe { out.write(v) };
            true
        }
        None => false,
    }
}

unsafe extern "C" fn host_get_bool(props: *const c_void, key: StrView, out: *mut bool) -> bool {
    if out.is_null() {
        return false;
    }
    match unsafe { lookup(props, key) } {
        Some(PropertyValue::Bool(b)) => {
            unsafe { out.write(*b) };
            true
        }
        _ => false,
    }
}

unsafe extern "C" fn host_get_string(props: *const c_void, key: StrView, out: *mut StrView) -> bool {
    if out.is_null() {
        return false;
    }
    match unsafe { lookup(props, key) }.and_then(PropertyValue::as_str) {
        Some(s) => {
            unsafe { out.write(StrView::borrowed(s)) };
            true
        }
        None => false,
    }
}

// ── Patches ───────────────────────────────────────────────────────────────

/// # Safety
/// `patch` must be null or point at a live, unaliased `PropertyBag`.
unsafe fn write_patch(patch: *mut c_void, key: StrView, value: PropertyValue) -> PluginStatus {
    if patch.is_null() {
        return PluginStatus::InvalidArgument;
    }
    let key = match unsafe { view_to_str(key, "property key") } {
        Ok(k) if !k.trim().is_empty() => k.trim(),
        _ => return PluginStatus::InvalidArgument,
    };
    let bag = unsafe { &mut *patch.cast::<PropertyBag>() };
    bag.insert(key.to_string(), value);
    PluginStatus::Ok
}

unsafe extern "C" fn host_set_number(patch: *mut c_void, key: StrView, value: f64) -> PluginStatus {
    if !value.is_finite() {
        return PluginStatus::InvalidArgument;
    }
    unsafe { write_patch(patch, key, PropertyValue::Double(value)) }
}

unsafe extern "C" fn host_set_bool(patch: *mut c_void, key: StrView, value: bool) -> PluginStatus {
    unsafe { write_patch(patch, key, PropertyValue::Bool(value)) }
}

unsafe extern "C" fn host_set_string(patch: *mut c_void, key: StrView, value: StrView) -> PluginStatus {
    let Ok(value) = (unsafe { view_to_string(value, "property value") }) else {
        return PluginStatus::InvalidArgument;
    };
    unsafe { write_patch(patch, key, PropertyValue::String(value)) }
}

// ── Drawing ───────────────────────────────────────────────────────────────

/// Wraps a painter so it can cross the boundary as a thin pointer.
pub(crate) struct PaintTarget<'a> {
    pub painter: &'a mut dyn WidgetPainter,
}

/// # Safety
/// `ctx` must be null or point at a live `PaintTarget`.
unsafe fn painter<'a>(ctx: *mut c_void) -> Option<&'a mut dyn WidgetPainter> {
    let target = unsafe { ctx.cast::<PaintTarget<'a>>().as_mut() }?;
    Some(&mut *target.painter)
}

unsafe extern "C" fn host_fill_rect(ctx: *mut c_void, rect: AbiRect, color: AbiColor) {
    if let Some(p) = unsafe { painter(ctx) } {
        p.fill_rect(rect.into(), color.into());
    }
}

unsafe extern "C" fn host_stroke_rect(ctx: *mut c_void, rect: AbiRect, color: AbiColor, width: f32) {
    if let Some(p) = unsafe { painter(ctx) } {
        p.stroke_rect(rect.into(), color.into(), width);
    }
}

unsafe extern "C" fn host_text(ctx: *mut c_void, rect: AbiRect, text: StrView, color: AbiColor) {
    let Some(p) = (unsafe { painter(ctx) }) else { return };
    match unsafe { view_to_str(text, "text") } {
        Ok(text) => p.text(rect.into(), text, color.into()),
        Err(e) => log::warn!("plugin text call dropped: {e}"),
    }
}

/// Raw pointer to a bag for a callback that only reads it.
pub(crate) fn props_ptr(props: &PropertyBag) -> *const c_void {
    ptr::from_ref(props).cast()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_decode() {
        unsafe {
            assert_eq!(view_to_str(StrView::empty(), "t").unwrap(), "");
            assert_eq!(view_to_str(StrView::from_static("knob"), "t").unwrap(), "knob");

            let dangling = StrView { ptr: ptr::null(), len: 3 };
            assert!(matches!(view_to_str(dangling, "t"), Err(PluginError::NullPointer("t"))));

            let bad = [0xff_u8, 0xfe];
            let view = StrView { ptr: bad.as_ptr(), len: bad.len() };
            assert!(matches!(view_to_string(view, "t"), Err(PluginError::InvalidUtf8("t"))));
        }
    }

    #[test]
    fn property_getters_check_types() {
        let mut bag = PropertyBag::new();
        bag.insert("gain".into(), PropertyValue::Int(3));
        bag.insert("armed".into(), PropertyValue::Bool(true));
        bag.insert("label".into(), PropertyValue::String("Gain".into()));
        let api = host_api(ptr::null_mut());
        let props = props_ptr(&bag);

        unsafe {
            let mut n = 0.0;
            assert!((api.props.get_number)(props, StrView::from_static("gain"), &mut n));
            assert_eq!(n, 3.0);
            assert!(!(api.props.get_number)(props, StrView::from_static("label"), &mut n));

            let mut b = false;
            assert!((api.props.get_bool)(props, StrView::from_static("armed"), &mut b));
            assert!(b);

            let mut s = StrView::empty();
            assert!((api.props.get_string)(props, StrView::from_static("label"), &mut s));
            assert_eq!(view_to_str(s, "t").unwrap(), "Gain");
            assert!(!(api.props.get_string)(ptr::null(), StrView::from_static("label"), &mut s));
        }
    }

    #[test]
    fn patch_setters_reject_bad_input() {
        let mut bag = PropertyBag::new();
        let api = host_api(ptr::null_mut());
        let patch = ptr::from_mut(&mut bag).cast::<c_void>();

        unsafe {
            assert_eq!((api.patch.set_number)(patch, StrView::from_static(" peak "), 0.5), PluginStatus::Ok);
            assert_eq!((api.patch.set_number)(patch, StrView::from_static("x"), f64::NAN), PluginStatus::InvalidArgument);
            assert_eq!((api.patch.set_bool)(patch, StrView::from_static(""), true), PluginStatus::InvalidArgument);
            assert_eq!(
                (api.patch.set_string)(patch, StrView::from_static("label"), StrView::from_static("Peak")),
                PluginStatus::Ok
            );
        }
        assert_eq!(bag["peak"], PropertyValue::Double(0.5));
        assert_eq!(bag["label"], PropertyValue::String("Peak".into()));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn register_without_registry_fails() {
        let api = host_api(ptr::null_mut());
        let desc = WidgetDescriptorV1::new(StrView::from_static("a.b"), StrView::empty());
        let status = unsafe { (api.register_widget)(api.host_ctx, &desc) };
        assert_eq!(status, PluginStatus::Failed);
    }
}
