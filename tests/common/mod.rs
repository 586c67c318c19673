//! Builders for assembling coverage model trees in tests. Rates and totals
//! are computed from the lines handed in, the way the parser would.
#![allow(dead_code)]

use covgaps::model::{
    rate, BranchCondition, ClassCoverage, CoverageReport, LineCoverage, LineScope, MethodCoverage,
    PackageCoverage,
};

pub fn line(number: u32, hits: u64) -> LineCoverage {
    LineCoverage {
        number,
        hits,
        is_branch: false,
        condition_coverage: None,
        conditions: Vec::new(),
        file_path: None,
        scope: LineScope::Method,
    }
}

pub fn class_line(number: u32, hits: u64) -> LineCoverage {
    LineCoverage {
        scope: LineScope::Class,
        ..line(number, hits)
    }
}

pub fn branch_line(
    number: u32,
    hits: u64,
    condition_coverage: Option<&str>,
    conditions: Vec<BranchCondition>,
) -> LineCoverage {
    LineCoverage {
        number,
        hits,
        is_branch: true,
        condition_coverage: condition_coverage.map(str::to_string),
        conditions,
        file_path: None,
        scope: LineScope::Method,
    }
}

pub fn condition(number: u32, coverage: &str) -> BranchCondition {
    BranchCondition {
        number,
        kind: "jump".to_string(),
        coverage: coverage.to_string(),
    }
}

pub fn method(name: &str, signature: &str, lines: Vec<LineCoverage>) -> MethodCoverage {
    let total_lines = lines.len() as u32;
    let covered_lines = lines.iter().filter(|l| l.hits > 0).count() as u32;
    MethodCoverage {
        name: name.to_string(),
        signature: signature.to_string(),
        lines,
        line_rate: rate(covered_lines, total_lines),
        branch_rate: 0.0,
        complexity: 1,
        total_lines,
        covered_lines,
    }
}

pub fn class(
    name: &str,
    file_path: Option<&str>,
    methods: Vec<MethodCoverage>,
    class_lines: Vec<LineCoverage>,
) -> ClassCoverage {
    let method_total: u32 = methods.iter().map(|m| m.total_lines).sum();
    let method_covered: u32 = methods.iter().map(|m| m.covered_lines).sum();
    let total_lines = method_total + class_lines.len() as u32;
    let covered_lines = method_covered + class_lines.iter().filter(|l| l.hits > 0).count() as u32;
    let complexity = methods.iter().map(|m| m.complexity).sum();
    ClassCoverage {
        name: name.to_string(),
        file_path: file_path.map(str::to_string),
        methods,
        class_lines,
        line_rate: rate(covered_lines, total_lines),
        branch_rate: 0.0,
        complexity,
        total_lines,
        covered_lines,
    }
}

pub fn package(name: &str, classes: Vec<ClassCoverage>) -> PackageCoverage {
    let total_lines: u32 = classes.iter().map(|c| c.total_lines).sum();
    let covered_lines: u32 = classes.iter().map(|c| c.covered_lines).sum();
    let complexity: u32 = classes.iter().map(|c| c.complexity).sum();
    PackageCoverage {
        name: name.to_string(),
        classes,
        line_rate: rate(covered_lines, total_lines),
        branch_rate: 0.0,
        complexity,
        total_lines,
        covered_lines,
    }
}

pub fn report(packages: Vec<PackageCoverage>) -> CoverageReport {
    report_with_sources(packages, Vec::new())
}

pub fn report_with_sources(
    packages: Vec<PackageCoverage>,
    sources: Vec<String>,
) -> CoverageReport {
    let total_lines: u32 = packages.iter().map(|p| p.total_lines).sum();
    let covered_lines: u32 = packages.iter().map(|p| p.covered_lines).sum();
    let complexity: u32 = packages.iter().map(|p| p.complexity).sum();
    CoverageReport {
        packages,
        sources,
        line_rate: rate(covered_lines, total_lines),
        branch_rate: 0.0,
        complexity,
        timestamp: 0,
        version: "1.9".to_string(),
        lines_covered: covered_lines,
        lines_valid: total_lines,
        branches_covered: 0,
        branches_valid: 0,
        total_lines,
        covered_lines,
    }
}

/// One package / one class / one method with `total` lines, the first
/// `covered` of them hit once.
pub fn simple_report(
    package_name: &str,
    class_name: &str,
    method_name: &str,
    total: u32,
    covered: u32,
) -> CoverageReport {
    simple_report_with_path(package_name, class_name, method_name, None, total, covered)
}

pub fn simple_report_with_path(
    package_name: &str,
    class_name: &str,
    method_name: &str,
    file_path: Option<&str>,
    total: u32,
    covered: u32,
) -> CoverageReport {
    let lines = (1..=total)
        .map(|i| line(i, if i <= covered { 1 } else { 0 }))
        .collect();
    report(vec![package(
        package_name,
        vec![class(
            class_name,
            file_path,
            vec![method(method_name, "()", lines)],
            Vec::new(),
        )],
    )])
}

/// One package / one class / one method wrapping exactly these lines.
pub fn report_with_lines(
    package_name: &str,
    class_name: &str,
    method_name: &str,
    file_path: &str,
    lines: Vec<LineCoverage>,
) -> CoverageReport {
    report(vec![package(
        package_name,
        vec![class(
            class_name,
            Some(file_path),
            vec![method(method_name, "()", lines)],
            Vec::new(),
        )],
    )])
}
