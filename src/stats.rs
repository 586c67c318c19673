//! Coverage statistics recomputed by the merger after structural changes.

use crate::model::{LineCoverage, MethodCoverage};

/// Fraction of lines with at least one hit, or 0.0 for an empty slice.
#[must_use]
pub fn line_rate(lines: &[LineCoverage]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    let covered = lines.iter().filter(|l| l.hits > 0).count();
    covered as f64 / lines.len() as f64
}

/// Fraction of branch conditions with nonzero coverage, over all branch
/// lines that carry at least one condition. 0.0 when no such lines exist.
#[must_use]
pub fn branch_rate(lines: &[LineCoverage]) -> f64 {
    let branch_lines: Vec<&LineCoverage> = lines
        .iter()
        .filter(|l| l.is_branch && !l.conditions.is_empty())
        .collect();

    if branch_lines.is_empty() {
        return 0.0;
    }

    let total: usize = branch_lines.iter().map(|l| l.conditions.len()).sum();
    let covered: usize = branch_lines
        .iter()
        .map(|l| {
            l.conditions
                .iter()
                .filter(|c| parse_coverage_percent(&c.coverage) > 0.0)
                .count()
        })
        .sum();

    covered as f64 / total as f64
}

/// Arithmetic sum of method complexities.
#[must_use]
pub fn sum_complexity(methods: &[MethodCoverage]) -> u32 {
    methods.iter().map(|m| m.complexity).sum()
}

/// Numeric value of a percentage string like "50%" or "50".
///
/// Empty or unparseable input yields 0.0; a "(n/m)" suffix makes the
/// string unparseable and also yields 0.0.
#[must_use]
pub fn parse_coverage_percent(coverage: &str) -> f64 {
    if coverage.is_empty() {
        return 0.0;
    }
    coverage.trim_end_matches('%').parse().unwrap_or(0.0)
}
