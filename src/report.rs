//! Output formatting for missing-coverage rows: the shared line-range
//! notation plus the table, JSON, and markdown exporters.

use serde::Serialize;

use crate::extract::MissingCoverageRow;
use crate::paths::PathTransformer;

/// Format line numbers into collapsed bracket notation, e.g. "[10-12, 20]".
///
/// Input may be unsorted and contain duplicates; runs of consecutive
/// numbers collapse to "start-end". Empty input yields "[]".
#[must_use]
pub fn format_line_ranges(line_numbers: &[u32]) -> String {
    if line_numbers.is_empty() {
        return "[]".to_string();
    }

    let mut sorted = line_numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<String> = Vec::new();
    let mut start = sorted[0];
    let mut end = sorted[0];

    for &number in &sorted[1..] {
        if number == end + 1 {
            end = number;
        } else {
            ranges.push(format_range(start, end));
            start = number;
            end = number;
        }
    }
    ranges.push(format_range(start, end));

    format!("[{}]", ranges.join(", "))
}

fn format_range(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

/// Renders missing-coverage rows to one of the output formats.
pub trait Exporter {
    /// Render `rows`, truncated to `limit` entries when given, with the
    /// path transformer applied to each row's file path.
    fn export(
        &self,
        rows: &[MissingCoverageRow],
        limit: Option<usize>,
        paths: &PathTransformer,
    ) -> String;
}

fn apply_limit<'a>(rows: &'a [MissingCoverageRow], limit: Option<usize>) -> &'a [MissingCoverageRow] {
    match limit {
        Some(n) => &rows[..n.min(rows.len())],
        None => rows,
    }
}

fn escape_pipes(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Pipe-separated table, the default output format.
pub struct TableExporter;

const TABLE_HEADER: &str = "File|Class|Method|Lines|Hits|BranchCoverage|BranchConditions";

impl Exporter for TableExporter {
    fn export(
        &self,
        rows: &[MissingCoverageRow],
        limit: Option<usize>,
        paths: &PathTransformer,
    ) -> String {
        let mut lines = vec![TABLE_HEADER.to_string()];

        for row in apply_limit(rows, limit) {
            lines.push(
                [
                    escape_pipes(&paths.transform(&row.file)),
                    escape_pipes(&row.class_name),
                    escape_pipes(row.method.as_deref().unwrap_or("")),
                    escape_pipes(&format_line_ranges(&row.line_numbers)),
                    row.hits.to_string(),
                    escape_pipes(row.branch_coverage.as_deref().unwrap_or("")),
                    escape_pipes(row.branch_conditions.as_deref().unwrap_or("")),
                ]
                .join("|"),
            );
        }

        lines.join("\n")
    }
}

/// Compact JSON array with camelCase keys.
pub struct JsonExporter;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonRow<'a> {
    file: String,
    class: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'a str>,
    lines: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch_coverage: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch_conditions: Option<&'a str>,
}

impl Exporter for JsonExporter {
    fn export(
        &self,
        rows: &[MissingCoverageRow],
        limit: Option<usize>,
        paths: &PathTransformer,
    ) -> String {
        let json_rows: Vec<JsonRow<'_>> = apply_limit(rows, limit)
            .iter()
            .map(|row| {
                let is_branch = row.branch_coverage.is_some();
                JsonRow {
                    file: paths.transform(&row.file),
                    class: &row.class_name,
                    method: row.method.as_deref(),
                    lines: format_line_ranges(&row.line_numbers),
                    // Hits carries no information on a branch row; it only
                    // appears on plain rows, always as 0.
                    hits: if is_branch { None } else { Some(row.hits) },
                    branch_coverage: row.branch_coverage.as_deref(),
                    branch_conditions: row.branch_conditions.as_deref(),
                }
            })
            .collect();

        serde_json::to_string(&json_rows).expect("rows serialize to JSON")
    }
}

/// Markdown table.
pub struct MarkdownExporter;

const MARKDOWN_HEADER: &str =
    "| File | Class | Method | Lines | Hits | Branch Coverage | Branch Conditions |";
const MARKDOWN_SEPARATOR: &str =
    "|------|-------|--------|-------|------|-----------------|-------------------|";

impl Exporter for MarkdownExporter {
    fn export(
        &self,
        rows: &[MissingCoverageRow],
        limit: Option<usize>,
        paths: &PathTransformer,
    ) -> String {
        let mut lines = vec![MARKDOWN_HEADER.to_string(), MARKDOWN_SEPARATOR.to_string()];

        for row in apply_limit(rows, limit) {
            let cells = [
                escape_pipes(&paths.transform(&row.file)),
                escape_pipes(&row.class_name),
                escape_pipes(row.method.as_deref().unwrap_or("")),
                escape_pipes(&format_line_ranges(&row.line_numbers)),
                row.hits.to_string(),
                escape_pipes(row.branch_coverage.as_deref().unwrap_or("")),
                escape_pipes(row.branch_conditions.as_deref().unwrap_or("")),
            ];
            lines.push(format!("| {} |", cells.join(" | ")));
        }

        lines.join("\n")
    }
}
