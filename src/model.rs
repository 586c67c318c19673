//! In-memory representation of a Cobertura coverage report. The parser
//! produces one `CoverageReport` per input file; the merger folds N of them
//! into one; the extractor walks the merged tree.
//!
//! Every type here is an immutable value: merging never mutates an input,
//! it builds new instances. Equality is structural.

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(covered) / f64::from(total)
    }
}

/// Whether a line belongs to a method or directly to its class.
///
/// Cobertura repeats method lines under the class element; lines that appear
/// only at class level (field initializers, static blocks) get `Class` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineScope {
    Method,
    Class,
}

/// An individual branch outcome from Cobertura's `<condition>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchCondition {
    pub number: u32,
    /// Condition type, e.g. "jump" or "switch".
    pub kind: String,
    /// Coverage percentage string, e.g. "50%".
    pub coverage: String,
}

/// A single instrumentable line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineCoverage {
    pub number: u32,
    pub hits: u64,
    pub is_branch: bool,
    /// Aggregate condition coverage string as reported, e.g. "50% (1/2)".
    pub condition_coverage: Option<String>,
    pub conditions: Vec<BranchCondition>,
    /// Resolved path of the owning class's source file.
    pub file_path: Option<String>,
    pub scope: LineScope,
}

/// A method and the lines it declares.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCoverage {
    pub name: String,
    pub signature: String,
    pub lines: Vec<LineCoverage>,
    pub line_rate: f64,
    pub branch_rate: f64,
    pub complexity: u32,
    pub total_lines: u32,
    pub covered_lines: u32,
}

/// A class: its methods plus the lines owned by the class itself.
///
/// Merge identity is (name, file_path) — the same class name under two
/// different files stays two classes (generated/partial-class splits).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCoverage {
    pub name: String,
    pub file_path: Option<String>,
    pub methods: Vec<MethodCoverage>,
    /// Lines not declared by any method of this class.
    pub class_lines: Vec<LineCoverage>,
    pub line_rate: f64,
    pub branch_rate: f64,
    pub complexity: u32,
    pub total_lines: u32,
    pub covered_lines: u32,
}

/// A package/namespace grouping of classes. Merge identity is the name.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageCoverage {
    pub name: String,
    pub classes: Vec<ClassCoverage>,
    pub line_rate: f64,
    pub branch_rate: f64,
    pub complexity: u32,
    pub total_lines: u32,
    pub covered_lines: u32,
}

/// The complete result of parsing one Cobertura file.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    pub packages: Vec<PackageCoverage>,
    /// Source roots from the `<sources>` element, in document order.
    pub sources: Vec<String>,
    pub line_rate: f64,
    pub branch_rate: f64,
    pub complexity: u32,
    pub timestamp: i64,
    pub version: String,
    pub lines_covered: u32,
    pub lines_valid: u32,
    pub branches_covered: u32,
    pub branches_valid: u32,
    /// Sum of package totals, recomputed after any structural change.
    pub total_lines: u32,
    pub covered_lines: u32,
}

impl CoverageReport {
    /// A fully-zeroed report: empty package list, empty sources, empty
    /// version string. This is what merging zero inputs yields.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            packages: Vec::new(),
            sources: Vec::new(),
            line_rate: 0.0,
            branch_rate: 0.0,
            complexity: 0,
            timestamp: 0,
            version: String::new(),
            lines_covered: 0,
            lines_valid: 0,
            branches_covered: 0,
            branches_valid: 0,
            total_lines: 0,
            covered_lines: 0,
        }
    }
}
