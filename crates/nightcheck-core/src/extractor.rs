//! Runtime error extraction from script logs.
//!
//! Two strategies, tried in order for each log:
//!
//! 1. **Bracketed mode**: the first `Traceback` line through the next line
//!    containing `Error` is returned verbatim.
//! 2. **Scanning mode**: a two-state machine ([`ScanState`]) walks the log
//!    line by line. An error marker opens a block, every line inside the block
//!    is appended to the excerpt once, and a blank line or a line starting
//!    with `-` closes it.
//!
//! Independently of both, any `Permission denied` line turns the verdict
//! into exactly [`PERMISSION_DENIED_VERDICT`] when bracketed mode found
//! nothing.
//!
//! Both modes run over a single buffered pass; the log is never loaded whole.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::mem;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::FamilyConfig;
use crate::domain::verdict::Verdict;

/// Opens a bracketed block and a scanning block.
pub const TRACEBACK_MARKER: &str = "Traceback";

/// Closes a bracketed block.
pub const ERROR_END_MARKER: &str = "Error";

/// Case-insensitive substring that opens a scanning block.
pub const ERROR_MARKER: &str = "error";

pub const PERMISSION_DENIED_MARKER: &str = "Permission denied";

pub const PERMISSION_DENIED_VERDICT: &str = "Permission Denied";

/// Appended after every line of a scanning-mode excerpt.
pub const BREAK_MARKER: &str = "</br>";

/// Collects the first `Traceback` line through the next `Error` line,
/// inclusive, one raw line at a time.
///
/// The end marker is only searched on lines after the start line. A block
/// without an end line is not a bracketed block.
#[derive(Debug, Default)]
struct BracketedBlock {
    block: Option<String>,
}

impl BracketedBlock {
    /// Feed one line with its terminator. Returns the block once it closes.
    fn feed(&mut self, raw: &str) -> Option<String> {
        let text = raw.trim_end_matches(['\n', '\r']);
        match self.block.as_mut() {
            Some(block) if text.contains(ERROR_END_MARKER) => {
                block.push_str(text);
                Some(mem::take(block))
            }
            Some(block) => {
                block.push_str(raw);
                None
            }
            None => {
                if text.contains(TRACEBACK_MARKER) {
                    self.block = Some(raw.to_string());
                }
                None
            }
        }
    }
}

/// Whether the scanner is inside an error block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Outside,
    Inside,
}

impl ScanState {
    /// Advance over one trimmed line.
    ///
    /// Returns the next state and whether the line belongs to the excerpt.
    pub fn step(self, line: &str) -> (ScanState, bool) {
        if closes_block(line) {
            (ScanState::Outside, false)
        } else if opens_block(line) {
            (ScanState::Inside, true)
        } else {
            (self, self == ScanState::Inside)
        }
    }
}

fn opens_block(line: &str) -> bool {
    line.contains(TRACEBACK_MARKER) || line.to_lowercase().contains(ERROR_MARKER)
}

fn closes_block(line: &str) -> bool {
    line.is_empty() || line.starts_with('-')
}

/// Line-by-line scanning-mode extractor for a single log.
#[derive(Debug)]
pub struct BlockScanner<'a> {
    state: ScanState,
    excerpt: String,
    seen: HashSet<String>,
    permission_denied: bool,
    scan_blocks: bool,
    ignore_markers: &'a [String],
}

impl<'a> BlockScanner<'a> {
    /// Scanner using a family's block and ignore settings.
    pub fn for_family(family: &'a FamilyConfig) -> Self {
        Self::new(family.scan_error_blocks, &family.ignore_markers)
    }

    pub fn new(scan_blocks: bool, ignore_markers: &'a [String]) -> Self {
        Self {
            state: ScanState::Outside,
            excerpt: String::new(),
            seen: HashSet::new(),
            permission_denied: false,
            scan_blocks,
            ignore_markers,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feed one raw log line.
    pub fn feed(&mut self, raw: &str) {
        let line = raw.trim();

        if line.contains(PERMISSION_DENIED_MARKER) {
            self.permission_denied = true;
        }
        if !self.scan_blocks || self.is_ignored(line) {
            return;
        }

        let (next, contributes) = self.state.step(line);
        self.state = next;
        if contributes && self.seen.insert(line.to_string()) {
            self.excerpt.push_str(line);
            self.excerpt.push_str(BREAK_MARKER);
        }
    }

    fn is_ignored(&self, line: &str) -> bool {
        self.ignore_markers
            .iter()
            .any(|m| !m.is_empty() && line.contains(m.as_str()))
    }

    /// Excerpt accumulated so far.
    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    pub fn finish(self) -> Verdict {
        if self.permission_denied {
            Verdict::Failure(PERMISSION_DENIED_VERDICT.to_string())
        } else {
            Verdict::from_text(self.excerpt)
        }
    }
}

/// Runs bracketed mode and scanning mode over the same pass.
fn scan_lines<'a, I>(family: &FamilyConfig, lines: I) -> io::Result<Verdict>
where
    I: IntoIterator<Item = io::Result<Cow<'a, str>>>,
{
    let mut bracketed = BracketedBlock::default();
    let mut scanner = BlockScanner::for_family(family);
    for line in lines {
        let line = line?;
        if let Some(block) = bracketed.feed(&line) {
            return Ok(Verdict::Failure(block));
        }
        scanner.feed(&line);
    }
    Ok(scanner.finish())
}

/// Runtime verdict for log content already in memory.
pub fn extract_from_content(family: &FamilyConfig, content: &str) -> Verdict {
    let lines = content
        .split_inclusive('\n')
        .map(|line| Ok(Cow::Borrowed(line)));
    match scan_lines(family, lines) {
        Ok(verdict) => verdict,
        Err(e) => Verdict::Failure(e.to_string()),
    }
}

/// Runtime verdict for any line source, read one line at a time.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn extract_from_reader<R: BufRead>(
    family: &FamilyConfig,
    mut reader: R,
) -> io::Result<Verdict> {
    let mut buf = Vec::new();
    let lines = std::iter::from_fn(move || {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(Cow::Owned(String::from_utf8_lossy(&buf).into_owned()))),
            Err(e) => Some(Err(e)),
        }
    });
    scan_lines(family, lines)
}

/// Runtime verdict for one log file.
///
/// A log that cannot be read produces a descriptive verdict, not an error.
pub fn extract_from_log(family: &FamilyConfig, log: &Path) -> Verdict {
    match File::open(log).and_then(|file| extract_from_reader(family, BufReader::new(file))) {
        Ok(verdict) => verdict,
        Err(e) => {
            debug!(log = %log.display(), error = %e, "log not readable");
            Verdict::Failure(format!("Unable to open {}. {}", log.display(), e))
        }
    }
}

/// One runtime verdict per log, in the order given.
pub fn extract_runtime_errors(family: &FamilyConfig, logs: &[PathBuf]) -> Vec<Verdict> {
    logs.iter().map(|log| extract_from_log(family, log)).collect()
}
