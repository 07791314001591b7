//! Console report rendering.
//!
//! Renders the three-column table (script, syntax error, runtime error) for
//! a run or for rows read back from storage, followed by a coverage section
//! listing scripts that were discovered but not checked.

use std::io::{self, Write};

use crate::domain::record::{RunReport, ScriptRecord, SkipReason, UncheckedScript};
use crate::extractor::BREAK_MARKER;

/// Column headers of the report table.
pub const TABLE_HEADERS: [&str; 3] = ["Script Name", "Syntax Error", "Runtime Error"];

/// Cells wider than this wrap onto continuation lines.
pub const MAX_CELL_WIDTH: usize = 72;

/// One table row, already in text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub script: String,
    pub syntax: String,
    pub runtime: String,
}

impl ReportRow {
    pub fn new(
        script: impl Into<String>,
        syntax: impl Into<String>,
        runtime: impl Into<String>,
    ) -> Self {
        Self {
            script: script.into(),
            syntax: syntax.into(),
            runtime: runtime.into(),
        }
    }
}

impl From<&ScriptRecord> for ReportRow {
    fn from(record: &ScriptRecord) -> Self {
        ReportRow::new(
            record.path.display().to_string(),
            record.syntax.as_text(),
            record.runtime_text(),
        )
    }
}

/// Split a cell into display lines: break markers become line breaks and
/// long lines wrap at [`MAX_CELL_WIDTH`].
fn cell_lines(text: &str) -> Vec<String> {
    let normalized = text.replace(BREAK_MARKER, "\n");
    let mut lines = Vec::new();
    for line in normalized.trim_end().lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(MAX_CELL_WIDTH) {
            lines.push(chunk.iter().collect());
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn separator(widths: &[usize; 3], fill: char) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.push_str(&fill.to_string().repeat(w + 2));
        line.push('+');
    }
    line
}

fn write_row(out: &mut impl Write, widths: &[usize; 3], cells: &[Vec<String>; 3]) -> io::Result<()> {
    let height = cells.iter().map(Vec::len).max().unwrap_or(1);
    for i in 0..height {
        let mut line = String::from("|");
        for (col, cell) in cells.iter().enumerate() {
            let text = cell.get(i).map(String::as_str).unwrap_or("");
            let pad = widths[col] - text.chars().count();
            line.push(' ');
            line.push_str(text);
            line.push_str(&" ".repeat(pad + 1));
            line.push('|');
        }
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Render the report table for `rows`.
pub fn render_table(out: &mut impl Write, rows: &[ReportRow]) -> io::Result<()> {
    let header: [Vec<String>; 3] = TABLE_HEADERS.map(|h| vec![h.to_string()]);
    let body: Vec<[Vec<String>; 3]> = rows
        .iter()
        .map(|r| [cell_lines(&r.script), cell_lines(&r.syntax), cell_lines(&r.runtime)])
        .collect();

    let mut widths = [0usize; 3];
    for cells in std::iter::once(&header).chain(body.iter()) {
        for (col, cell) in cells.iter().enumerate() {
            let w = cell.iter().map(|l| l.chars().count()).max().unwrap_or(0);
            widths[col] = widths[col].max(w);
        }
    }

    writeln!(out, "{}", separator(&widths, '-'))?;
    write_row(out, &widths, &header)?;
    writeln!(out, "{}", separator(&widths, '='))?;
    for cells in &body {
        write_row(out, &widths, cells)?;
        writeln!(out, "{}", separator(&widths, '-'))?;
    }
    Ok(())
}

fn render_unchecked(out: &mut impl Write, unchecked: &[UncheckedScript]) -> io::Result<()> {
    if unchecked.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "Not checked ({}):", unchecked.len())?;
    for script in unchecked {
        let reason = match script.reason {
            SkipReason::Unclassified => "interpreter not recognised".to_string(),
            SkipReason::Unsupported => format!("no syntax checker for {}", script.family),
        };
        writeln!(out, "  - {} ({})", script.path.display(), reason)?;
    }
    Ok(())
}

/// Render a full run report: table, coverage gaps and a summary line.
pub fn render_run_report(out: &mut impl Write, report: &RunReport) -> io::Result<()> {
    let rows: Vec<ReportRow> = report.records.iter().map(ReportRow::from).collect();
    render_table(out, &rows)?;
    render_unchecked(out, &report.unchecked)?;
    writeln!(out)?;
    writeln!(
        out,
        "{} script(s) checked, {} with errors, {} not checked ({} ms)",
        report.records.len(),
        report.failing_count(),
        report.unchecked.len(),
        report.duration_ms()
    )
}

/// Convenience wrapper rendering into a `String`.
pub fn render_run_report_string(report: &RunReport) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = render_run_report(&mut buf, report);
    String::from_utf8_lossy(&buf).into_owned()
}
