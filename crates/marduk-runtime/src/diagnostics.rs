//! Rate-limited logging of dispatch reports.
//!
//! Routine reports go out at `info` no more often than
//! [`DiagnosticsConfig::min_interval`]; the ones in between are counted and
//! mentioned in the next line that is written. Reports with failures, thread
//! policy blocks, or a hit action limit are always written, at `warn`.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use crate::binding::DispatchReport;
use crate::property::BindingApplyReport;

#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    /// Minimum spacing between routine `info` lines.
    pub min_interval: Duration,
    /// Also report events that matched no binding.
    pub log_empty: bool,
    /// Notes printed per report; the rest are summarized.
    pub max_notes: usize,
}

impl DiagnosticsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, yes: bool) -> Self {
        self.enabled = yes;
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn log_empty(mut self, yes: bool) -> Self {
        self.log_empty = yes;
        self
    }

    pub fn max_notes(mut self, n: usize) -> Self {
        self.max_notes = n;
        self
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval: Duration::from_millis(250),
            log_empty: false,
            max_notes: 8,
        }
    }
}

/// One-line summary of a dispatch report.
pub fn format_report(report: &DispatchReport, max_notes: usize) -> String {
    let mut line = format!(
        "widget {} '{}': {} binding(s), {} queued, {} executed ({} ok, {} failed, {} skipped, {} deferred)",
        report.source_id,
        report.event_key,
        report.matched_bindings,
        report.queued_actions,
        report.executed_actions,
        report.succeeded,
        report.failed,
        report.skipped,
        report.deferred,
    );

    let flags = [
        (report.document_changed, "document changed"),
        (report.params_changed, "params changed"),
        (report.action_limit_hit, "action limit hit"),
        (report.blocked_by_thread_policy, "blocked by thread policy"),
    ];
    for (set, label) in flags {
        if set {
            let _ = write!(line, " [{label}]");
        }
    }

    for note in report.notes.iter().take(max_notes) {
        let _ = write!(line, "\n  - {note}");
    }
    if report.notes.len() > max_notes {
        let _ = write!(line, "\n  - ... {} more note(s)", report.notes.len() - max_notes);
    }
    line
}

/// One-line summary of a property binding pass.
pub fn format_apply_report(report: &BindingApplyReport) -> String {
    if report.reentrant {
        return "property bindings: nested pass refused".to_string();
    }
    format!(
        "property bindings: {} evaluated, {} applied, {} failed",
        report.evaluated, report.applied, report.failed
    )
}

/// Stateful logger for dispatch reports.
#[derive(Debug, Clone)]
pub struct RuntimeDiagnostics {
    config: DiagnosticsConfig,
    last_emit: Option<Instant>,
    suppressed: u64,
}

impl RuntimeDiagnostics {
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self { config, last_emit: None, suppressed: 0 }
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    /// Reports dropped by the rate limit since the last written line.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Logs `report` if the config and rate limit allow it, returning the
    /// written line.
    pub fn record(&mut self, report: &DispatchReport) -> Option<String> {
        self.record_at(report, Instant::now())
    }

    /// [`record`](Self::record) with an explicit clock reading.
    pub fn record_at(&mut self, report: &DispatchReport, now: Instant) -> Option<String> {
        if !self.config.enabled || (report.is_empty() && !self.config.log_empty) {
            return None;
        }

        let problem = report.has_failures() || report.blocked_by_thread_policy || report.action_limit_hit;
        if !problem {
            if let Some(last) = self.last_emit {
                if now.saturating_duration_since(last) < self.config.min_interval {
                    self.suppressed += 1;
                    return None;
                }
            }
        }

        let mut line = format_report(report, self.config.max_notes);
        if self.suppressed > 0 {
            let _ = write!(line, " ({} report(s) suppressed)", self.suppressed);
            self.suppressed = 0;
        }
        if problem {
            log::warn!("{line}");
        } else {
            log::info!("{line}");
            self.last_emit = Some(now);
        }
        Some(line)
    }

    /// Logs a property binding pass when something went wrong in it.
    pub fn record_apply(&mut self, report: &BindingApplyReport) -> Option<String> {
        if !self.config.enabled || (report.failed == 0 && !report.reentrant) {
            return None;
        }
        let line = format_apply_report(report);
        log::warn!("{line}");
        Some(line)
    }
}

impl Default for RuntimeDiagnostics {
    fn default() -> Self {
        Self::new(DiagnosticsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(failed: usize) -> DispatchReport {
        DispatchReport {
            source_id: 3,
            event_key: "clicked".into(),
            matched_bindings: 1,
            queued_actions: 2,
            executed_actions: 2,
            succeeded: 2 - failed,
            failed,
            params_changed: true,
            ..Default::default()
        }
    }

    #[test]
    fn format_includes_counts_and_flags() {
        let line = format_report(&report(0), 8);
        assert!(line.starts_with("widget 3 'clicked': 1 binding(s), 2 queued, 2 executed (2 ok"));
        assert!(line.contains("[params changed]"));
        assert!(!line.contains("[document changed]"));
    }

    #[test]
    fn format_truncates_notes() {
        let mut r = report(0);
        r.notes = (0..5).map(|i| format!("note {i}")).collect();
        let line = format_report(&r, 2);
        assert!(line.contains("note 1"));
        assert!(!line.contains("note 2"));
        assert!(line.contains("3 more note(s)"));
    }

    #[test]
    fn routine_reports_are_rate_limited() {
        let mut diag = RuntimeDiagnostics::new(DiagnosticsConfig::new().min_interval(Duration::from_millis(100)));
        let t0 = Instant::now();

        assert!(diag.record_at(&report(0), t0).is_some());
        assert!(diag.record_at(&report(0), t0 + Duration::from_millis(10)).is_none());
        assert!(diag.record_at(&report(0), t0 + Duration::from_millis(20)).is_none());
        assert_eq!(diag.suppressed(), 2);

        let line = diag.record_at(&report(0), t0 + Duration::from_millis(150)).unwrap();
        assert!(line.ends_with("(2 report(s) suppressed)"));
        assert_eq!(diag.suppressed(), 0);
    }

    #[test]
    fn failures_bypass_the_rate_limit() {
        let mut diag = RuntimeDiagnostics::default();
        let t0 = Instant::now();
        diag.record_at(&report(0), t0);
        assert!(diag.record_at(&report(1), t0).is_some());
    }

    #[test]
    fn empty_and_disabled() {
        let mut diag = RuntimeDiagnostics::default();
        assert!(diag.record(&DispatchReport::default()).is_none());

        let mut quiet = RuntimeDiagnostics::new(DiagnosticsConfig::new().enabled(false));
        assert!(quiet.record(&report(1)).is_none());

        let mut verbose = RuntimeDiagnostics::new(DiagnosticsConfig::new().log_empty(true));
        assert!(verbose.record(&DispatchReport::default()).is_some());
    }

    #[test]
    fn apply_reports_only_on_trouble() {
        let mut diag = RuntimeDiagnostics::default();
        assert!(diag.record_apply(&BindingApplyReport { evaluated: 2, applied: 2, ..Default::default() }).is_none());
        let line = diag
            .record_apply(&BindingApplyReport { evaluated: 2, applied: 1, failed: 1, ..Default::default() })
            .unwrap();
        assert_eq!(line, "property bindings: 2 evaluated, 1 applied, 1 failed");
    }
}
