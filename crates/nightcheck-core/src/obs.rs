//! Structured observability hooks for the NightCheck run lifecycle.
//!
//! Provides a run-scoped span via the [`RunSpan`] guard and one emitter per
//! lifecycle event. Everything is emitted through `tracing`, so the output
//! format follows whatever [`crate::telemetry::init_tracing`] configured.

use std::path::Path;

use tracing::{info, warn};

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// ```ignore
/// let _span = RunSpan::enter("3f1c...");
/// // every event below carries run_id
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run id.
    pub fn enter(run_id: &str) -> Self {
        Self {
            _span: run_span(run_id).entered(),
        }
    }
}

/// The run-scoped span itself, for instrumenting async work.
///
/// An entered guard must not be held across `.await`; futures use
/// `tracing::Instrument::instrument(run_span(id))` instead.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("nightcheck.run", run_id = %run_id)
}

/// Emit event: run started over `directories` directories.
pub fn emit_run_started(run_id: &str, directories: usize) {
    info!(event = "run.started", run_id = %run_id, directories = directories);
}

/// Emit event: one script went through syntax and runtime checks.
pub fn emit_script_checked(
    path: &Path,
    family: &str,
    syntax_clean: bool,
    logs: usize,
    runtime_clean: bool,
) {
    info!(
        event = "script.checked",
        path = %path.display(),
        family = %family,
        syntax_clean = syntax_clean,
        logs = logs,
        runtime_clean = runtime_clean,
    );
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, checked: usize, failing: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        checked = checked,
        failing = failing,
    );
}

/// Emit event: persisting one record failed (warning level).
pub fn emit_insert_failed(caller: &str, error: &dyn std::fmt::Display) {
    warn!(event = "store.insert_failed", caller = %caller, error = %error);
}

/// Emit event: the result table was truncated by the retention rule.
pub fn emit_pruned(max_age_days: i64) {
    info!(event = "store.pruned", max_age_days = max_age_days);
}
