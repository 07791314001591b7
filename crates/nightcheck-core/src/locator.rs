//! Log destination lookup in scheduler (crontab) text.
//!
//! A scheduled entry references a script and usually redirects its output:
//!
//! ```text
//! 30 2 * * * /scripts/foo.py >> /var/log/foo.log 2>&1
//! ```
//!
//! Every non-comment line mentioning the script contributes the path after
//! its last `>>` (or, failing that, its last `>`). Lines discarding output
//! to `/dev/null` contribute nothing.

use std::path::PathBuf;

/// Marker for commented-out scheduler lines.
pub const COMMENT_MARKER: char = '#';

/// Output sink that never produces a log.
pub const NULL_SINK: &str = "dev/null";

/// Find the log paths referenced next to `script` in `scheduler_text`.
///
/// Order follows the scheduler text; duplicates are kept.
pub fn locate_logs(script: &str, scheduler_text: &str) -> Vec<PathBuf> {
    if script.is_empty() {
        return Vec::new();
    }
    scheduler_text
        .lines()
        .filter(|line| line.contains(script))
        .filter(|line| !is_disabled(line))
        .filter_map(redirect_target)
        .map(PathBuf::from)
        .collect()
}

/// Comment lines and null-sink redirects never yield a log.
fn is_disabled(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT_MARKER) || line.contains(NULL_SINK)
}

/// Destination of the last append redirect, else of the last overwrite
/// redirect.
pub fn redirect_target(line: &str) -> Option<&str> {
    last_target(line, append_operators(line)).or_else(|| last_target(line, overwrite_operators(line)))
}

/// Byte offsets just past each `>>`.
fn append_operators(line: &str) -> Vec<usize> {
    line.match_indices(">>").map(|(i, op)| i + op.len()).collect()
}

/// Byte offsets just past each lone `>` (not part of `>>`).
fn overwrite_operators(line: &str) -> Vec<usize> {
    let bytes = line.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| {
            b == b'>'
                && bytes.get(i + 1) != Some(&b'>')
                && (i == 0 || bytes[i - 1] != b'>')
        })
        .map(|(i, _)| i + 1)
        .collect()
}

/// First token after the last operator that names a file.
fn last_target(line: &str, ends: Vec<usize>) -> Option<&str> {
    ends.into_iter().rev().find_map(|end| {
        line[end..]
            .split_whitespace()
            .next()
            .filter(|token| !token.starts_with('&'))
    })
}
