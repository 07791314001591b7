//! Syntax and runtime verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text persisted and printed for a clean verdict.
pub const NONE_SENTINEL: &str = "None";

/// Outcome of a single syntax check or log scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    /// Nothing found.
    Clean,

    /// Error excerpt or diagnostic text (never empty).
    Failure(String),
}

impl Verdict {
    /// Build a verdict from captured text; blank text is `Clean`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Verdict::Clean
        } else {
            Verdict::Failure(text)
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, Verdict::Clean)
    }

    /// Text form, with `Clean` rendered as the `"None"` sentinel.
    pub fn as_text(&self) -> &str {
        match self {
            Verdict::Clean => NONE_SENTINEL,
            Verdict::Failure(text) => text,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

/// Collapse per-log runtime verdicts into one stored text.
///
/// All-clean (or no logs at all) collapses to the sentinel; otherwise each
/// verdict's text is kept in log order, one per line.
pub fn combine_runtime(verdicts: &[Verdict]) -> String {
    if verdicts.iter().all(Verdict::is_clean) {
        return NONE_SENTINEL.to_string();
    }
    verdicts
        .iter()
        .map(Verdict::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}
