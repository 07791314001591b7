//! Per-script results and the per-run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::family::Family;
use crate::domain::verdict::{combine_runtime, Verdict};

/// Result of checking one script during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    /// Absolute path of the script.
    pub path: PathBuf,

    /// Family the script was classified into.
    pub family: Family,

    /// Syntax-check verdict.
    pub syntax: Verdict,

    /// Log destinations found in the scheduler table, in scan order.
    pub logs: Vec<PathBuf>,

    /// One runtime verdict per entry in `logs`.
    pub runtime: Vec<Verdict>,
}

impl ScriptRecord {
    /// Whether either verdict reports a problem.
    pub fn has_errors(&self) -> bool {
        !self.syntax.is_clean() || self.runtime.iter().any(|v| !v.is_clean())
    }

    /// Runtime verdicts collapsed to the stored text form.
    pub fn runtime_text(&self) -> String {
        combine_runtime(&self.runtime)
    }
}

/// Why a discovered script was not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Shared extension, but no declaration pattern matched.
    Unclassified,

    /// Family has no syntax command configured.
    Unsupported,
}

/// A discovered script that produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncheckedScript {
    pub path: PathBuf,
    pub family: Family,
    pub reason: SkipReason,
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: Vec<ScriptRecord>,
    pub unchecked: Vec<UncheckedScript>,
}

impl RunReport {
    /// Number of checked scripts with at least one failing verdict.
    pub fn failing_count(&self) -> usize {
        self.records.iter().filter(|r| r.has_errors()).count()
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(syntax: Verdict, runtime: Vec<Verdict>) -> ScriptRecord {
        ScriptRecord {
            path: PathBuf::from("/opt/scripts/foo.py"),
            family: Family::Python3,
            syntax,
            logs: vec![PathBuf::from("/var/log/foo.log")],
            runtime,
        }
    }

    #[test]
    fn test_clean_record_has_no_errors() {
        let r = record(Verdict::Clean, vec![Verdict::Clean]);
        assert!(!r.has_errors());
        assert_eq!(r.runtime_text(), "None");
    }

    #[test]
    fn test_runtime_failure_counts_as_error() {
        let r = record(
            Verdict::Clean,
            vec![Verdict::Failure("Permission Denied".to_string())],
        );
        assert!(r.has_errors());
        assert_eq!(r.runtime_text(), "Permission Denied");
    }

    #[test]
    fn test_failing_count() {
        let now = Utc::now();
        let report = RunReport {
            run_id: "run-1".to_string(),
            started_at: now,
            finished_at: now,
            records: vec![
                record(Verdict::Clean, vec![]),
                record(Verdict::Failure("SyntaxError".to_string()), vec![]),
            ],
            unchecked: vec![],
        };
        assert_eq!(report.failing_count(), 1);
        assert_eq!(report.duration_ms(), 0);
    }
}
