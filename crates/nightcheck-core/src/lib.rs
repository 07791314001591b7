//! NightCheck core library
//!
//! Classification of scripts into interpreter families, log lookup in
//! scheduler text, runtime error extraction from logs and report rendering.
//! Process execution and storage live in `nightcheck-runner` and
//! `nightcheck-state`.

pub mod classifier;
pub mod config;
pub mod domain;
pub mod extractor;
pub mod locator;
pub mod obs;
pub mod reporting;
pub mod resolver;
pub mod telemetry;

pub use classifier::{Classifier, FileFamilyIndex};
pub use config::{FamilyConfig, NightCheckConfig, PATH_PLACEHOLDER};
pub use domain::{
    combine_runtime, CheckError, Family, Result, RunReport, ScriptRecord, SkipReason,
    UncheckedScript, Verdict, NONE_SENTINEL,
};
pub use extractor::{
    extract_from_content, extract_from_log, extract_from_reader, extract_runtime_errors,
    BlockScanner, ScanState,
};
pub use locator::{locate_logs, redirect_target};
pub use resolver::{read_declaration_line, resolve_family, resolve_line, Declaration};
pub use reporting::{render_run_report, render_run_report_string, render_table, ReportRow};

pub use obs::{
    emit_insert_failed, emit_pruned, emit_run_finished, emit_run_started, emit_script_checked,
    run_span, RunSpan,
};
pub use telemetry::init_tracing;

/// NightCheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
