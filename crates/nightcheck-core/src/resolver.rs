//! Interpreter resolution from a script's declaration line.
//!
//! Several families can share one extension (`.py` is used by both the bare
//! `python` and the `python3` interpreters). The first line of the file
//! decides which one applies.

use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::config::FamilyConfig;
use crate::domain::error::Result;
use crate::domain::family::Family;

/// A compiled declaration pattern for one family.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub family: Family,
    pub pattern: Regex,
}

impl Declaration {
    /// Compile the declaration of a family config, if it has one.
    pub fn from_config(config: &FamilyConfig) -> Result<Option<Self>> {
        Ok(config.declaration_regex()?.map(|pattern| Declaration {
            family: config.family,
            pattern,
        }))
    }
}

/// Read the first line of `path`, without its line terminator.
///
/// Bytes are decoded lossily so binary or latin-1 files still resolve.
pub fn read_declaration_line(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    reader.read_until(b'\n', &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).trim_end().to_string())
}

/// Match a declaration line against the candidates, in order.
pub fn resolve_line(line: &str, candidates: &[Declaration]) -> Option<Family> {
    candidates
        .iter()
        .find(|d| d.pattern.is_match(line))
        .map(|d| d.family)
}

/// Resolve the family of `path` from its first line.
///
/// Returns `Ok(None)` when no candidate matches; I/O failures propagate.
pub fn resolve_family(path: &Path, candidates: &[Declaration]) -> io::Result<Option<Family>> {
    let line = read_declaration_line(path)?;
    Ok(resolve_line(&line, candidates))
}
