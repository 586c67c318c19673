//! Extraction of "missing coverage" rows from a merged report.
//!
//! Each class contributes two kinds of line collections: its class-level
//! lines and each method's lines. Collections are scanned independently, so
//! a row never spans a method boundary. Within a collection, consecutive
//! uncovered plain lines collapse into one row, while an under-covered
//! branch line always gets a row of its own.

use crate::model::{BranchCondition, CoverageReport, LineCoverage};

/// One reportable unit of untested code: either a run of uncovered plain
/// lines or a single branch line with incomplete condition coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingCoverageRow {
    pub file: String,
    pub class_name: String,
    /// None for class-level lines.
    pub method: Option<String>,
    pub line_numbers: Vec<u32>,
    /// Always 0: a row only exists for lines lacking coverage.
    pub hits: u64,
    /// The line's condition-coverage summary, or "unknown"; None for
    /// plain rows.
    pub branch_coverage: Option<String>,
    /// Formatted condition list, e.g. "[0:jump 0%,1:jump 100%]"; None for
    /// plain rows and for branch lines without condition detail.
    pub branch_conditions: Option<String>,
}

/// Walk a report and produce every missing-coverage row, fully ordered by
/// file, class, method (class-level rows first), then first line number.
#[must_use]
pub fn extract(report: &CoverageReport) -> Vec<MissingCoverageRow> {
    let mut rows = Vec::new();

    for package in &report.packages {
        for class in &package.classes {
            let file = class.file_path.clone().unwrap_or_default();

            extract_from_lines(&class.class_lines, &file, &class.name, None, &mut rows);

            for method in &class.methods {
                extract_from_lines(
                    &method.lines,
                    &file,
                    &class.name,
                    Some(&method.name),
                    &mut rows,
                );
            }
        }
    }

    rows.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then_with(|| a.class_name.cmp(&b.class_name))
            .then_with(|| {
                a.method
                    .as_deref()
                    .unwrap_or("")
                    .cmp(b.method.as_deref().unwrap_or(""))
            })
            .then_with(|| a.line_numbers[0].cmp(&b.line_numbers[0]))
    });

    rows
}

/// Scan one line collection, buffering runs of uncovered plain lines and
/// emitting each under-covered branch line immediately as its own row.
fn extract_from_lines(
    lines: &[LineCoverage],
    file: &str,
    class_name: &str,
    method: Option<&str>,
    rows: &mut Vec<MissingCoverageRow>,
) {
    let mut sorted: Vec<&LineCoverage> = lines.iter().collect();
    sorted.sort_by_key(|l| l.number);

    let mut buffer: Vec<u32> = Vec::new();

    for line in sorted {
        if line.is_branch && has_incomplete_branch_coverage(line) {
            if !buffer.is_empty() {
                rows.push(plain_row(file, class_name, method, std::mem::take(&mut buffer)));
            }
            rows.push(branch_row(file, class_name, method, line));
        } else if line.hits == 0 {
            buffer.push(line.number);
        }
    }

    if !buffer.is_empty() {
        rows.push(plain_row(file, class_name, method, buffer));
    }
}

/// Whether a branch line's conditions fall short of full coverage.
///
/// Condition detail wins over the summary string; a branch line carrying
/// neither is flagged as incomplete (its coverage is unknown).
fn has_incomplete_branch_coverage(line: &LineCoverage) -> bool {
    if !line.conditions.is_empty() {
        return line
            .conditions
            .iter()
            .any(|c| !c.coverage.eq_ignore_ascii_case("100%"));
    }

    if let Some(summary) = line.condition_coverage.as_deref().filter(|s| !s.is_empty()) {
        return !summary.starts_with("100%");
    }

    true
}

fn plain_row(
    file: &str,
    class_name: &str,
    method: Option<&str>,
    line_numbers: Vec<u32>,
) -> MissingCoverageRow {
    MissingCoverageRow {
        file: file.to_string(),
        class_name: class_name.to_string(),
        method: method.map(str::to_string),
        line_numbers,
        hits: 0,
        branch_coverage: None,
        branch_conditions: None,
    }
}

fn branch_row(
    file: &str,
    class_name: &str,
    method: Option<&str>,
    line: &LineCoverage,
) -> MissingCoverageRow {
    let branch_coverage = line
        .condition_coverage
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    MissingCoverageRow {
        file: file.to_string(),
        class_name: class_name.to_string(),
        method: method.map(str::to_string),
        line_numbers: vec![line.number],
        hits: 0,
        branch_coverage: Some(branch_coverage),
        branch_conditions: format_branch_conditions(&line.conditions),
    }
}

fn format_branch_conditions(conditions: &[BranchCondition]) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }

    let formatted: Vec<String> = conditions
        .iter()
        .map(|c| format!("{}:{} {}", c.number, c.kind, c.coverage))
        .collect();

    Some(format!("[{}]", formatted.join(",")))
}
