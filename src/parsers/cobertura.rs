/// Parser for Cobertura XML coverage reports.
///
/// Cobertura XML structure:
///   <coverage line-rate="..." branch-rate="..." timestamp="..." version="...">
///     <sources><source>...</source></sources>
///     <packages>
///       <package name="...">
///         <classes>
///           <class name="..." filename="..." line-rate="...">
///             <methods>
///               <method name="..." signature="...">
///                 <lines><line number="..." hits="..." .../></lines>
///               </method>
///             </methods>
///             <lines>
///               <line number="..." hits="..." branch="true|false"
///                     condition-coverage="50% (1/2)">
///                 <conditions>
///                   <condition number="0" type="jump" coverage="50%"/>
///                 </conditions>
///               </line>
///             </lines>
///           </class>
///         </classes>
///       </package>
///     </packages>
///   </coverage>
///
/// A line belongs to a method when any method declares its number; the
/// class-level copy Cobertura emits for such lines is discarded. Numeric
/// attributes that fail to parse fall back to their defaults rather than
/// rejecting the report (producers vary in strictness).
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{CovgapsError, Result};
use crate::model::{
    BranchCondition, ClassCoverage, CoverageReport, LineCoverage, LineScope, MethodCoverage,
    PackageCoverage,
};
use crate::parsers::Parser;

pub struct CoberturaParser;

impl Parser for CoberturaParser {
    fn parse(&self, input: &[u8]) -> Result<CoverageReport> {
        parse_cobertura(input)
    }
}

fn parse_cobertura(input: &[u8]) -> Result<CoverageReport> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut state = ParserState::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(e.into()),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                state.start_element(e)?;
            }
            Ok(Event::Empty(ref e)) => {
                // A self-closing element is an open immediately followed by
                // a close.
                state.start_element(e)?;
                state.end_element(e.name().as_ref());
            }
            Ok(Event::End(ref e)) => {
                state.end_element(e.name().as_ref());
            }
            Ok(Event::Text(ref e)) => {
                if state.in_source {
                    if let Ok(text) = e.unescape() {
                        if !text.trim().is_empty() {
                            state.sources.push(text.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    state.finish()
}

/// Report-level attributes captured from the `<coverage>` root.
#[derive(Default)]
struct ReportAttrs {
    line_rate: f64,
    branch_rate: f64,
    complexity: u32,
    timestamp: i64,
    version: String,
    lines_covered: Option<u32>,
    lines_valid: Option<u32>,
    branches_covered: u32,
    branches_valid: u32,
}

struct PackageState {
    name: String,
    line_rate: f64,
    branch_rate: f64,
    complexity: u32,
    classes: Vec<ClassCoverage>,
}

struct ClassState {
    name: String,
    file_path: Option<String>,
    line_rate: f64,
    branch_rate: f64,
    complexity: u32,
    methods: Vec<MethodCoverage>,
    class_lines: Vec<LineCoverage>,
}

struct MethodState {
    name: String,
    signature: String,
    line_rate: f64,
    branch_rate: f64,
    complexity: u32,
    lines: Vec<LineCoverage>,
}

struct LineState {
    number: u32,
    hits: u64,
    is_branch: bool,
    condition_coverage: Option<String>,
    conditions: Vec<BranchCondition>,
}

#[derive(Default)]
struct ParserState {
    saw_root: bool,
    attrs: ReportAttrs,
    sources: Vec<String>,
    in_source: bool,
    packages: Vec<PackageCoverage>,
    package: Option<PackageState>,
    class: Option<ClassState>,
    method: Option<MethodState>,
    line: Option<LineState>,
}

impl ParserState {
    fn start_element(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let name = e.name();
        let local = name.as_ref();

        if !self.saw_root {
            if local != b"coverage" {
                return Err(CovgapsError::Parse(
                    "missing 'coverage' root element".to_string(),
                ));
            }
            self.saw_root = true;
            let attrs = attr_map(e);
            self.attrs = ReportAttrs {
                line_rate: parse_attr(&attrs, "line-rate", 0.0),
                branch_rate: parse_attr(&attrs, "branch-rate", 0.0),
                complexity: parse_attr(&attrs, "complexity", 0),
                timestamp: parse_attr(&attrs, "timestamp", 0),
                version: attrs.get("version").cloned().unwrap_or_default(),
                lines_covered: attrs.get("lines-covered").and_then(|v| v.parse().ok()),
                lines_valid: attrs.get("lines-valid").and_then(|v| v.parse().ok()),
                branches_covered: parse_attr(&attrs, "branches-covered", 0),
                branches_valid: parse_attr(&attrs, "branches-valid", 0),
            };
            return Ok(());
        }

        match local {
            b"source" => {
                self.in_source = true;
            }
            b"package" => {
                let attrs = attr_map(e);
                self.package = Some(PackageState {
                    name: attrs.get("name").cloned().unwrap_or_default(),
                    line_rate: parse_attr(&attrs, "line-rate", 0.0),
                    branch_rate: parse_attr(&attrs, "branch-rate", 0.0),
                    complexity: parse_attr(&attrs, "complexity", 0),
                    classes: Vec::new(),
                });
            }
            b"class" => {
                let attrs = attr_map(e);
                let file_path =
                    resolve_file_path(attrs.get("filename").map(String::as_str), &self.sources);
                self.class = Some(ClassState {
                    name: attrs.get("name").cloned().unwrap_or_default(),
                    file_path,
                    line_rate: parse_attr(&attrs, "line-rate", 0.0),
                    branch_rate: parse_attr(&attrs, "branch-rate", 0.0),
                    complexity: parse_attr(&attrs, "complexity", 0),
                    methods: Vec::new(),
                    class_lines: Vec::new(),
                });
            }
            b"method" => {
                let attrs = attr_map(e);
                self.method = Some(MethodState {
                    name: attrs.get("name").cloned().unwrap_or_default(),
                    signature: attrs.get("signature").cloned().unwrap_or_default(),
                    line_rate: parse_attr(&attrs, "line-rate", 0.0),
                    branch_rate: parse_attr(&attrs, "branch-rate", 0.0),
                    complexity: parse_attr(&attrs, "complexity", 0),
                    lines: Vec::new(),
                });
            }
            b"line" => {
                let attrs = attr_map(e);
                self.line = Some(LineState {
                    number: parse_attr(&attrs, "number", 0),
                    hits: parse_attr(&attrs, "hits", 0),
                    is_branch: attrs
                        .get("branch")
                        .map(|v| v.eq_ignore_ascii_case("true"))
                        .unwrap_or(false),
                    condition_coverage: attrs.get("condition-coverage").cloned(),
                    conditions: Vec::new(),
                });
            }
            b"condition" => {
                if let Some(line) = self.line.as_mut() {
                    let attrs = attr_map(e);
                    line.conditions.push(BranchCondition {
                        number: parse_attr(&attrs, "number", 0),
                        kind: attrs.get("type").cloned().unwrap_or_default(),
                        coverage: attrs.get("coverage").cloned().unwrap_or_default(),
                    });
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn end_element(&mut self, local: &[u8]) {
        match local {
            b"source" => {
                self.in_source = false;
            }
            b"line" => {
                if let Some(line) = self.line.take() {
                    self.push_line(line);
                }
            }
            b"method" => {
                if let Some(method) = self.method.take() {
                    let finished = method.finish();
                    if let Some(class) = self.class.as_mut() {
                        class.methods.push(finished);
                    }
                }
            }
            b"class" => {
                if let Some(class) = self.class.take() {
                    let finished = class.finish();
                    if let Some(package) = self.package.as_mut() {
                        package.classes.push(finished);
                    }
                }
            }
            b"package" => {
                if let Some(package) = self.package.take() {
                    self.packages.push(package.finish());
                }
            }
            _ => {}
        }
    }

    fn push_line(&mut self, line: LineState) {
        let file_path = self.class.as_ref().and_then(|c| c.file_path.clone());
        if let Some(method) = self.method.as_mut() {
            method.lines.push(line.into_line(file_path, LineScope::Method));
        } else if let Some(class) = self.class.as_mut() {
            class.class_lines.push(line.into_line(file_path, LineScope::Class));
        }
    }

    fn finish(self) -> Result<CoverageReport> {
        if !self.saw_root {
            return Err(CovgapsError::Parse(
                "missing 'coverage' root element".to_string(),
            ));
        }

        let total_lines: u32 = self.packages.iter().map(|p| p.total_lines).sum();
        let covered_lines: u32 = self.packages.iter().map(|p| p.covered_lines).sum();
        let attrs = self.attrs;

        Ok(CoverageReport {
            packages: self.packages,
            sources: self.sources,
            line_rate: attrs.line_rate,
            branch_rate: attrs.branch_rate,
            complexity: attrs.complexity,
            timestamp: attrs.timestamp,
            version: attrs.version,
            lines_covered: attrs.lines_covered.unwrap_or(covered_lines),
            lines_valid: attrs.lines_valid.unwrap_or(total_lines),
            branches_covered: attrs.branches_covered,
            branches_valid: attrs.branches_valid,
            total_lines,
            covered_lines,
        })
    }
}

impl LineState {
    fn into_line(self, file_path: Option<String>, scope: LineScope) -> LineCoverage {
        LineCoverage {
            number: self.number,
            hits: self.hits,
            is_branch: self.is_branch,
            condition_coverage: self.condition_coverage,
            conditions: self.conditions,
            file_path,
            scope,
        }
    }
}

impl MethodState {
    fn finish(self) -> MethodCoverage {
        let total_lines = self.lines.len() as u32;
        let covered_lines = self.lines.iter().filter(|l| l.hits > 0).count() as u32;
        MethodCoverage {
            name: self.name,
            signature: self.signature,
            lines: self.lines,
            line_rate: self.line_rate,
            branch_rate: self.branch_rate,
            complexity: self.complexity,
            total_lines,
            covered_lines,
        }
    }
}

impl ClassState {
    fn finish(mut self) -> ClassCoverage {
        // Lines declared by a method belong to the method; drop the
        // class-level duplicates Cobertura emits for them.
        let method_numbers: HashSet<u32> = self
            .methods
            .iter()
            .flat_map(|m| m.lines.iter().map(|l| l.number))
            .collect();
        self.class_lines.retain(|l| !method_numbers.contains(&l.number));

        let method_total: u32 = self.methods.iter().map(|m| m.total_lines).sum();
        let method_covered: u32 = self.methods.iter().map(|m| m.covered_lines).sum();
        let total_lines = method_total + self.class_lines.len() as u32;
        let covered_lines =
            method_covered + self.class_lines.iter().filter(|l| l.hits > 0).count() as u32;

        ClassCoverage {
            name: self.name,
            file_path: self.file_path,
            methods: self.methods,
            class_lines: self.class_lines,
            line_rate: self.line_rate,
            branch_rate: self.branch_rate,
            complexity: self.complexity,
            total_lines,
            covered_lines,
        }
    }
}

impl PackageState {
    fn finish(self) -> PackageCoverage {
        let total_lines: u32 = self.classes.iter().map(|c| c.total_lines).sum();
        let covered_lines: u32 = self.classes.iter().map(|c| c.covered_lines).sum();
        PackageCoverage {
            name: self.name,
            classes: self.classes,
            line_rate: self.line_rate,
            branch_rate: self.branch_rate,
            complexity: self.complexity,
            total_lines,
            covered_lines,
        }
    }
}

/// Resolve a `filename` attribute against the declared source roots.
///
/// Absolute paths pass through; otherwise the first root under which the
/// file actually exists wins, falling back to the raw declared name.
fn resolve_file_path(raw: Option<&str>, sources: &[String]) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }

    if Path::new(raw).is_absolute() {
        return Some(raw.to_string());
    }

    for source in sources {
        let candidate = Path::new(source).join(raw);
        if candidate.exists() {
            return Some(candidate.to_string_lossy().into_owned());
        }
    }

    Some(raw.to_string())
}

/// Extract attributes from an XML element into a HashMap.
fn attr_map(e: &BytesStart<'_>) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| {
            let attr = a.ok()?;
            let key = str::from_utf8(attr.key.local_name().into_inner())
                .ok()?
                .to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}

/// Parse a numeric attribute, falling back to the default on anything
/// malformed or missing.
fn parse_attr<T: FromStr + Copy>(attrs: &HashMap<String, String>, name: &str, default: T) -> T {
    attrs
        .get(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
