//! Merging N parsed coverage reports into one unified report.
//!
//! The same shape repeats at every level of the tree: group the entries by
//! their identity key, then merge each group. Packages key on name, classes
//! on (name, file path), methods on (name, signature), lines on
//! (number, scope), branch conditions on number. A group of one is returned
//! unchanged. Totals and rates are recomputed bottom-up from the merged
//! children, so the result is independent of input order.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{CovgapsError, Result};
use crate::model::{
    rate, BranchCondition, ClassCoverage, CoverageReport, LineCoverage, MethodCoverage,
    PackageCoverage,
};
use crate::stats;

/// Merge zero or more coverage reports into one.
///
/// Zero inputs yield [`CoverageReport::empty`]; a single input is returned
/// unchanged. Fails when the same line is reported both as a branch and as
/// a plain line.
pub fn merge(reports: Vec<CoverageReport>) -> Result<CoverageReport> {
    if reports.is_empty() {
        return Ok(CoverageReport::empty());
    }
    if reports.len() == 1 {
        return Ok(reports.into_iter().next().expect("length checked"));
    }

    let version = reports[0].version.clone();
    let timestamp = reports.iter().map(|r| r.timestamp).max().unwrap_or(0);

    // Union of source roots, first-seen order.
    let mut sources: Vec<String> = Vec::new();
    for report in &reports {
        for source in &report.sources {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }
    }

    let all_packages: Vec<PackageCoverage> =
        reports.into_iter().flat_map(|r| r.packages).collect();
    let packages = merge_packages(all_packages)?;

    let total_lines: u32 = packages.iter().map(|p| p.total_lines).sum();
    let covered_lines: u32 = packages.iter().map(|p| p.covered_lines).sum();
    let complexity: u32 = packages.iter().map(|p| p.complexity).sum();

    Ok(CoverageReport {
        packages,
        sources,
        line_rate: rate(covered_lines, total_lines),
        // Recomputing this would require aggregating every condition across
        // all packages; reported as 0.0 after a merge.
        branch_rate: 0.0,
        complexity,
        timestamp,
        version,
        lines_covered: covered_lines,
        lines_valid: total_lines,
        branches_covered: 0,
        branches_valid: 0,
        total_lines,
        covered_lines,
    })
}

/// Group `items` by `key`, preserving first-seen group order.
fn group_by<T, K, F>(items: Vec<T>, key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let k = key(&item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }

    groups
}

fn merge_packages(packages: Vec<PackageCoverage>) -> Result<Vec<PackageCoverage>> {
    group_by(packages, |p| p.name.clone())
        .into_iter()
        .map(|(name, group)| merge_package_group(name, group))
        .collect()
}

fn merge_package_group(name: String, group: Vec<PackageCoverage>) -> Result<PackageCoverage> {
    if group.len() == 1 {
        return Ok(group.into_iter().next().expect("length checked"));
    }

    let all_classes: Vec<ClassCoverage> = group.into_iter().flat_map(|p| p.classes).collect();
    let classes = merge_classes(all_classes)?;

    let total_lines: u32 = classes.iter().map(|c| c.total_lines).sum();
    let covered_lines: u32 = classes.iter().map(|c| c.covered_lines).sum();
    let complexity: u32 = classes.iter().map(|c| c.complexity).sum();

    Ok(PackageCoverage {
        name,
        classes,
        line_rate: rate(covered_lines, total_lines),
        branch_rate: 0.0,
        complexity,
        total_lines,
        covered_lines,
    })
}

fn merge_classes(classes: Vec<ClassCoverage>) -> Result<Vec<ClassCoverage>> {
    group_by(classes, |c| (c.name.clone(), c.file_path.clone()))
        .into_iter()
        .map(|(_, group)| merge_class_group(group))
        .collect()
}

fn merge_class_group(group: Vec<ClassCoverage>) -> Result<ClassCoverage> {
    if group.len() == 1 {
        return Ok(group.into_iter().next().expect("length checked"));
    }

    let name = group[0].name.clone();
    let file_path = group[0].file_path.clone();

    let mut all_methods = Vec::new();
    let mut all_class_lines = Vec::new();
    for class in group {
        all_methods.extend(class.methods);
        all_class_lines.extend(class.class_lines);
    }

    let methods = merge_methods(all_methods)?;
    let class_lines = merge_lines(all_class_lines)?;

    let method_total: u32 = methods.iter().map(|m| m.total_lines).sum();
    let method_covered: u32 = methods.iter().map(|m| m.covered_lines).sum();
    let total_lines = method_total + class_lines.len() as u32;
    let covered_lines =
        method_covered + class_lines.iter().filter(|l| l.hits > 0).count() as u32;
    let complexity = stats::sum_complexity(&methods);

    Ok(ClassCoverage {
        name,
        file_path,
        methods,
        class_lines,
        line_rate: rate(covered_lines, total_lines),
        branch_rate: 0.0,
        complexity,
        total_lines,
        covered_lines,
    })
}

fn merge_methods(methods: Vec<MethodCoverage>) -> Result<Vec<MethodCoverage>> {
    group_by(methods, |m| (m.name.clone(), m.signature.clone()))
        .into_iter()
        .map(|(_, group)| merge_method_group(group))
        .collect()
}

fn merge_method_group(group: Vec<MethodCoverage>) -> Result<MethodCoverage> {
    if group.len() == 1 {
        return Ok(group.into_iter().next().expect("length checked"));
    }

    let name = group[0].name.clone();
    let signature = group[0].signature.clone();
    // Complexity is a property of the method body, not of how often it was
    // measured: take the max, never the sum.
    let complexity = group.iter().map(|m| m.complexity).max().unwrap_or(0);

    let lines = merge_lines(group.into_iter().flat_map(|m| m.lines).collect())?;

    let total_lines = lines.len() as u32;
    let covered_lines = lines.iter().filter(|l| l.hits > 0).count() as u32;
    let line_rate = stats::line_rate(&lines);
    let branch_rate = stats::branch_rate(&lines);

    Ok(MethodCoverage {
        name,
        signature,
        lines,
        line_rate,
        branch_rate,
        complexity,
        total_lines,
        covered_lines,
    })
}

fn merge_lines(lines: Vec<LineCoverage>) -> Result<Vec<LineCoverage>> {
    let mut merged = group_by(lines, |l| (l.number, l.scope))
        .into_iter()
        .map(|(_, group)| merge_line_group(group))
        .collect::<Result<Vec<_>>>()?;
    merged.sort_by_key(|l| l.number);
    Ok(merged)
}

fn merge_line_group(group: Vec<LineCoverage>) -> Result<LineCoverage> {
    if group.len() == 1 {
        return Ok(group.into_iter().next().expect("length checked"));
    }

    let first = &group[0];
    if group.iter().any(|l| l.is_branch != first.is_branch) {
        return Err(CovgapsError::BranchFlagConflict { line: first.number });
    }

    let number = first.number;
    let is_branch = first.is_branch;
    let file_path = first.file_path.clone();
    let scope = first.scope;
    let hits = group.iter().map(|l| l.hits).sum();

    // First non-null summary among the inputs; not recomputed from the
    // merged conditions.
    let condition_coverage = if is_branch {
        group.iter().find_map(|l| l.condition_coverage.clone())
    } else {
        None
    };

    let conditions = merge_conditions(group.into_iter().flat_map(|l| l.conditions).collect());

    Ok(LineCoverage {
        number,
        hits,
        is_branch,
        condition_coverage,
        conditions,
        file_path,
        scope,
    })
}

fn merge_conditions(conditions: Vec<BranchCondition>) -> Vec<BranchCondition> {
    let mut merged: Vec<BranchCondition> = group_by(conditions, |c| c.number)
        .into_iter()
        .map(|(_, group)| merge_condition_group(group))
        .collect();
    merged.sort_by_key(|c| c.number);
    merged
}

fn merge_condition_group(group: Vec<BranchCondition>) -> BranchCondition {
    if group.len() == 1 {
        return group.into_iter().next().expect("length checked");
    }

    let max_coverage = group
        .iter()
        .map(|c| stats::parse_coverage_percent(&c.coverage))
        .fold(0.0, f64::max);

    BranchCondition {
        number: group[0].number,
        kind: group[0].kind.clone(),
        // Normalizes the format: any "(n/m)" suffix from the inputs is gone.
        coverage: format!("{max_coverage}%"),
    }
}
