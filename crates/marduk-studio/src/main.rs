mod demo_plugin;

use std::time::Duration;

use anyhow::{Context, Result};
use marduk_doc::action::{CreateAction, SetPropsAction, WidgetPropsPatch};
use marduk_doc::color::Rgba;
use marduk_doc::coords::{Rect, Vec2};
use marduk_doc::model::{DocumentModel, RuntimeValue, WidgetId, WidgetType};
use marduk_plugin::{PluginRegistry, WidgetPainter};
use marduk_runtime::diagnostics::{format_report, DiagnosticsConfig};
use marduk_runtime::logging::{init_logging, LoggingConfig};
use marduk_runtime::payload::RuntimePayload;
use marduk_runtime::{RuntimeDispatchThread, RuntimeSession, SessionConfig};

const KNOB: WidgetId = 1;
const METER: WidgetId = 2;
const BYPASS: WidgetId = 3;
const NUDGE: WidgetId = 4;
const STATUS: WidgetId = 5;

fn main() -> Result<()> {
    init_logging(LoggingConfig::new());

    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║        MARDUK STUDIO  (headless)       ║");
    println!("  ║   document · runtime · plugin host     ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    let document = build_document()?;
    let payload = load_payload()?;
    let config = SessionConfig::new().diagnostics(DiagnosticsConfig::new().min_interval(Duration::ZERO));
    let mut session = RuntimeSession::with_payload(document, payload, config)?;

    replay_events(&mut session)?;
    audio_thread_round(&mut session)?;
    plugin_round()?;

    let doc = session.document();
    println!("  [DOC] {} widget(s), {} group(s), {} layer(s)", doc.widgets.len(), doc.groups.len(), doc.layers.len());
    for (key, value) in session.params().iter() {
        println!("  [PARAM] {key:<10} = {value:?}");
    }
    println!();
    Ok(())
}

// ── Document ──────────────────────────────────────────────────────────────

fn build_document() -> Result<DocumentModel> {
    let mut doc = DocumentModel::new();
    let widgets = [
        CreateAction::widget(WidgetType::Knob, Rect::new(20.0, 20.0, 64.0, 64.0)).with_property("label", "Cutoff"),
        CreateAction::widget(WidgetType::Meter, Rect::new(100.0, 20.0, 16.0, 64.0)),
        CreateAction::widget(WidgetType::Toggle, Rect::new(20.0, 100.0, 48.0, 20.0)).with_property("text", "Bypass"),
        CreateAction::widget(WidgetType::Button, Rect::new(80.0, 100.0, 48.0, 20.0)).with_property("text", "Res +"),
        CreateAction::widget(WidgetType::Label, Rect::new(20.0, 130.0, 120.0, 18.0)).with_property("text", "ACTIVE"),
    ];
    for action in widgets {
        marduk_doc::apply(&mut doc, &action.into(), None)?;
    }

    marduk_doc::apply(&mut doc, &CreateAction::group("Filter", vec![KNOB, METER]).into(), None)?;
    marduk_doc::apply(&mut doc, &CreateAction::layer("Controls").into(), None)?;

    let dim = WidgetPropsPatch { opacity: Some(0.9), ..WidgetPropsPatch::default() };
    marduk_doc::apply(&mut doc, &SetPropsAction::widgets(vec![STATUS], dim).into(), None)?;

    log::info!("document built: widgets {:?}", doc.widget_ids());
    Ok(doc)
}

fn load_payload() -> Result<RuntimePayload> {
    match std::env::args().nth(1) {
        Some(path) => {
            let src = std::fs::read_to_string(&path).with_context(|| format!("reading runtime payload {path}"))?;
            RuntimePayload::from_json_str(&src).with_context(|| format!("loading runtime payload {path}"))
        }
        None => Ok(RuntimePayload::from_json_str(include_str!("../ui/runtime.json"))?),
    }
}

// ── Runtime ───────────────────────────────────────────────────────────────

fn replay_events(session: &mut RuntimeSession) -> Result<()> {
    let script = [
        (KNOB, "valueChanged", Some(RuntimeValue::Int(4000))),
        (NUDGE, "clicked", None),
        (NUDGE, "clicked", None),
        (BYPASS, "clicked", None),
        (METER, "clicked", None),
    ];
    for (source, event, value) in script {
        let out = session.dispatch(source, event, value.as_ref())?;
        println!("  [EVT] {source:>2} {event:<13} {}", format_report(&out.report, 4));
        if let Some(bindings) = out.bindings {
            println!("        bindings: {} applied, {} failed", bindings.applied, bindings.failed);
        }
    }

    let meter = session.document().widget(METER).context("meter widget vanished")?;
    println!(
        "  [METER] value={:?} height={} opacity={}",
        meter.properties.get("value"),
        meter.bounds.height(),
        meter.opacity
    );
    println!();
    Ok(())
}

/// Same bypass event, raised from the audio thread: widget actions and the
/// binding pass are queued and only land once the UI thread drains them.
fn audio_thread_round(session: &mut RuntimeSession) -> Result<()> {
    session.set_dispatch_thread(RuntimeDispatchThread::RealtimeAudio);
    let out = session.dispatch(BYPASS, "clicked", None)?;
    println!("  [AUDIO] {}", format_report(&out.report, 4));
    println!("  [AUDIO] {} action(s) waiting for the UI thread", session.pending_deferred().len());
    if out.bindings_deferred {
        println!("  [AUDIO] property bindings wait for the UI thread");
    }

    session.set_dispatch_thread(RuntimeDispatchThread::UiMessage);
    let results = session.run_deferred();
    let failed = results.iter().filter(|r| r.is_failure()).count();
    println!("  [UI]    ran {} deferred action(s), {failed} failed", results.len());
    println!();
    Ok(())
}

// ── Plugins ───────────────────────────────────────────────────────────────

struct LogPainter;

impl WidgetPainter for LogPainter {
    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        log::debug!("fill {rect:?} {:?}", color.to_srgb_u8());
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f32) {
        log::debug!("stroke {rect:?} {:?} w={width}", color.to_srgb_u8());
    }

    fn text(&mut self, rect: Rect, text: &str, _color: Rgba) {
        log::debug!("text {rect:?} {text:?}");
    }
}

fn plugin_round() -> Result<()> {
    let mut registry = PluginRegistry::new();
    // The entry point is linked into this binary, so its callbacks outlive the registry.
    let report = unsafe { registry.load(demo_plugin::entry) }?;
    for e in &report.rejected {
        log::warn!("plugin widget rejected: {e}");
    }

    let led = registry.get(demo_plugin::LED_TYPE).context("demo plugin did not register its LED")?;
    println!("  [PLUGIN] {} ({}), default bounds {:?}", led.display_name, led.type_key, led.default_bounds);

    let mut props = led.default_properties.clone();
    led.paint(led.default_bounds, &props, &mut LogPainter)?;
    let patch = led.interact(&props, "mouseDown", Vec2::new(8.0, 8.0))?;
    props.extend(patch);
    println!("  [PLUGIN] after click: {props:?}");

    if let Some(code) = led.export_code(&props)? {
        for line in code.constructor_lines.iter().chain(&code.resize_lines) {
            println!("           {line}");
        }
    }
    println!();
    Ok(())
}
