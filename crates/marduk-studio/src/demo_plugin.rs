//! A widget plugin compiled into the studio, used to exercise the plugin
//! host without loading a shared library.

use core::ffi::c_void;

use marduk_plugin::abi::{
    AbiColor,
    AbiRect,
    AbiSize,
    CodegenEmitFn,
    HostApiV1,
    PluginStatus,
    StrView,
    WidgetDescriptorV1,
    LOG_INFO,
    MARDUK_WIDGET_ABI_VERSION,
};

pub const LED_TYPE: &str = "demo.led";

const ON: AbiColor = AbiColor { r: 1.0, g: 0.2, b: 0.1, a: 1.0 };
const OFF: AbiColor = AbiColor { r: 0.25, g: 0.05, b: 0.05, a: 1.0 };

unsafe extern "C" fn led_paint(
    host: *const HostApiV1,
    draw_ctx: *mut c_void,
    props: *const c_void,
    bounds: AbiRect,
) -> PluginStatus {
    unsafe {
        let host = &*host;
        let draw = &*host.draw;
        let mut lit = false;
        (host.props.get_bool)(props, StrView::from_static("lit"), &mut lit);
        (draw.fill_rect)(draw_ctx, bounds, if lit { ON } else { OFF });
        (draw.stroke_rect)(draw_ctx, bounds, AbiColor { r: 0.0, g: 0.0, b: 0.0, a: 1.0 }, 1.0);
    }
    PluginStatus::Ok
}

unsafe extern "C" fn led_interact(
    host: *const HostApiV1,
    props: *const c_void,
    patch: *mut c_void,
    _event: StrView,
    _x: f32,
    _y: f32,
) -> PluginStatus {
    unsafe {
        let host = &*host;
        let mut lit = false;
        (host.props.get_bool)(props, StrView::from_static("lit"), &mut lit);
        (host.patch.set_bool)(patch, StrView::from_static("lit"), !lit)
    }
}

unsafe extern "C" fn led_codegen(
    _host: *const HostApiV1,
    _props: *const c_void,
    sink: *mut c_void,
    emit: CodegenEmitFn,
) -> PluginStatus {
    unsafe {
        emit(
            sink,
            StrView::from_static(r#"["led = std::make_unique<Led>();", "addAndMakeVisible(*led);"]"#),
            StrView::from_static(r#"["led->setBounds(x, y, w, h);"]"#),
        )
    }
}

/// Entry point; registers the LED widget type.
pub unsafe extern "C" fn entry(host: *const HostApiV1) -> PluginStatus {
    let Some(host) = (unsafe { host.as_ref() }) else {
        return PluginStatus::InvalidArgument;
    };
    if host.abi_version != MARDUK_WIDGET_ABI_VERSION {
        return PluginStatus::Incompatible;
    }

    let led = WidgetDescriptorV1 {
        default_bounds: AbiRect { x: 0.0, y: 0.0, w: 16.0, h: 16.0 },
        min_size: AbiSize { w: 6.0, h: 6.0 },
        default_properties_json: StrView::from_static(r#"{ "lit": false }"#),
        paint: Some(led_paint),
        interaction: Some(led_interact),
        export_codegen: Some(led_codegen),
        ..WidgetDescriptorV1::new(StrView::from_static(LED_TYPE), StrView::from_static("LED"))
    };
    unsafe {
        (host.log)(LOG_INFO, StrView::from_static("demo plugin registering LED"));
        (host.register_widget)(host.host_ctx, &led)
    }
}
