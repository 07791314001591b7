//! End-to-end NightCheck run: discovery, classification, checks, persistence.

use anyhow::Context;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use nightcheck_core::{
    emit_insert_failed, emit_pruned, emit_run_finished, emit_run_started, emit_script_checked,
    extract_runtime_errors, locate_logs, run_span, Classifier, Family, NightCheckConfig,
    RunReport, ScriptRecord, SkipReason, UncheckedScript,
};
use nightcheck_state::{ErrorRow, ErrorStore, DEFAULT_RETENTION_DAYS};

use crate::discovery::discover_scripts;
use crate::runner::CommandRunner;
use crate::scheduler::ScheduleSource;
use crate::syntax::SyntaxChecker;

/// Run orchestrator.
///
/// Scripts are processed one at a time: families in configuration order,
/// files sorted within each family. Rows are written after every record is
/// computed.
pub struct NightCheckPipeline {
    config: NightCheckConfig,
    classifier: Classifier,
    checker: SyntaxChecker,
    schedule: Arc<dyn ScheduleSource>,
    store: Option<Arc<dyn ErrorStore>>,
    retention_days: i64,
}

impl NightCheckPipeline {
    pub fn new(
        config: NightCheckConfig,
        runner: Arc<dyn CommandRunner>,
        schedule: Arc<dyn ScheduleSource>,
    ) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;
        let classifier = Classifier::new(&config)?;
        let checker = SyntaxChecker::new(runner, config.command_timeout());
        Ok(Self {
            config,
            classifier,
            checker,
            schedule,
            store: None,
            retention_days: DEFAULT_RETENTION_DAYS,
        })
    }

    /// Persist results (and apply retention) through `store`.
    pub fn with_store(mut self, store: Arc<dyn ErrorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    pub fn config(&self) -> &NightCheckConfig {
        &self.config
    }

    /// Discover scripts in the configured directories and check them.
    pub async fn run(&self) -> anyhow::Result<RunReport> {
        let files = discover_scripts(&self.config);
        self.run_on(&files).await
    }

    /// Check an explicit list of scripts.
    pub async fn run_on(&self, files: &[PathBuf]) -> anyhow::Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = run_span(&run_id);
        self.execute(run_id, files).instrument(span).await
    }

    async fn execute(&self, run_id: String, files: &[PathBuf]) -> anyhow::Result<RunReport> {
        let started_at = Utc::now();
        emit_run_started(&run_id, self.config.directories.len());

        self.prune().await;

        let schedule_text = self
            .schedule
            .fetch()
            .await
            .context("failed to read the scheduler table")?;

        let index = self.classifier.classify(files)?;
        info!(scripts = index.len(), "classified scripts");

        let mut records = Vec::new();
        let mut unchecked = Vec::new();

        for family in &self.config.families {
            let paths: Vec<PathBuf> = index.files(family.family).cloned().collect();
            if !family.is_supported() {
                for path in paths {
                    info!(path = %path.display(), family = %family.family, "no syntax checker");
                    unchecked.push(UncheckedScript {
                        path,
                        family: family.family,
                        reason: SkipReason::Unsupported,
                    });
                }
                continue;
            }

            for path in paths {
                let syntax = self
                    .checker
                    .check(family, &path)
                    .await
                    .with_context(|| format!("syntax check of {} failed", path.display()))?;

                let logs = locate_logs(&path.to_string_lossy(), &schedule_text);
                let runtime = extract_runtime_errors(family, &logs);

                let record = ScriptRecord {
                    path,
                    family: family.family,
                    syntax,
                    logs,
                    runtime,
                };
                emit_script_checked(
                    &record.path,
                    family.family.name(),
                    record.syntax.is_clean(),
                    record.logs.len(),
                    record.runtime.iter().all(|v| v.is_clean()),
                );
                records.push(record);
            }
        }

        for path in index.files(Family::Unclassified) {
            warn!(path = %path.display(), "interpreter could not be determined");
            unchecked.push(UncheckedScript {
                path: path.clone(),
                family: Family::Unclassified,
                reason: SkipReason::Unclassified,
            });
        }

        self.persist(&records).await;

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            records,
            unchecked,
        };
        emit_run_finished(
            &report.run_id,
            report.duration_ms(),
            report.records.len(),
            report.failing_count(),
        );
        Ok(report)
    }

    /// Apply the retention rule; failures are logged, not fatal.
    async fn prune(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let today = Utc::now().date_naive();
        match store.truncate_if_older_than(today, self.retention_days).await {
            Ok(true) => emit_pruned(self.retention_days),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "retention check failed"),
        }
    }

    /// Write one row per record; a failed insert does not stop the rest.
    async fn persist(&self, records: &[ScriptRecord]) {
        let Some(store) = &self.store else {
            return;
        };
        for record in records {
            let caller = record.path.to_string_lossy().into_owned();
            let row = ErrorRow::new(caller.clone(), record.syntax.as_text(), record.runtime_text());
            if let Err(e) = store.insert(row).await {
                emit_insert_failed(&caller, &e);
            }
        }
    }
}
