use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, ValueEnum};

use covgaps::extract::{self, MissingCoverageRow};
use covgaps::files;
use covgaps::merge;
use covgaps::model::CoverageReport;
use covgaps::parsers::cobertura::CoberturaParser;
use covgaps::parsers::Parser;
use covgaps::paths::PathTransformer;
use covgaps::report::{Exporter, JsonExporter, MarkdownExporter, TableExporter};

/// covgaps — Report missing code coverage from Cobertura XML files.
#[derive(ClapParser)]
#[command(name = "covgaps", version, about)]
struct Cli {
    /// Cobertura XML file paths or glob patterns.
    #[arg(required = true)]
    files: Vec<String>,

    /// Maximum number of rows to output.
    #[arg(long)]
    limit: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Show verbose processing information on stderr.
    #[arg(long)]
    verbose: bool,

    /// Show full absolute file paths instead of relative paths.
    #[arg(long, conflicts_with = "base_path")]
    absolute_paths: bool,

    /// Base directory for calculating relative paths (defaults to the
    /// current directory).
    #[arg(long)]
    base_path: Option<PathBuf>,

    /// Glob patterns for files to exclude from the report (repeatable).
    #[arg(long)]
    exclude: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Markdown,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let transformer = path_transformer(&cli)?;

    let resolved = files::resolve_files(&cli.files)?;

    if cli.verbose {
        eprintln!("Processing {} file(s):", resolved.len());
        for file in &resolved {
            eprintln!("  {}", file.display());
        }
    }

    let mut reports: Vec<CoverageReport> = Vec::new();
    for path in &resolved {
        let content = std::fs::read(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let report = CoberturaParser
            .parse(&content)
            .with_context(|| format!("Failed to parse '{}'", path.display()))?;
        reports.push(report);
    }

    let report_count = reports.len();
    let merged = merge::merge(reports)?;

    if cli.verbose {
        eprintln!("Merged {report_count} report(s).");
    }

    let mut rows = extract::extract(&merged);

    if !cli.exclude.is_empty() {
        rows = filter_excluded(rows, &cli.exclude)?;
        if cli.verbose {
            eprintln!("After exclusion filter: {} row(s) remaining.", rows.len());
        }
    }

    if rows.is_empty() {
        println!("Code coverage OK");
        return Ok(());
    }

    if cli.verbose {
        if let Some(limit) = cli.limit {
            if limit < rows.len() {
                eprintln!("Showing first {limit} of {} rows.", rows.len());
            }
        }
    }

    let exporter: Box<dyn Exporter> = match cli.output {
        OutputFormat::Table => Box::new(TableExporter),
        OutputFormat::Json => Box::new(JsonExporter),
        OutputFormat::Markdown => Box::new(MarkdownExporter),
    };

    println!("{}", exporter.export(&rows, cli.limit, &transformer));

    Ok(())
}

fn path_transformer(cli: &Cli) -> Result<PathTransformer> {
    if cli.absolute_paths {
        return Ok(PathTransformer::Identity);
    }

    if let Some(base) = &cli.base_path {
        if !base.is_dir() {
            bail!("Base path directory does not exist: {}", base.display());
        }
        let base = std::fs::canonicalize(base)
            .with_context(|| format!("Failed to resolve base path '{}'", base.display()))?;
        return Ok(PathTransformer::relative_to(base));
    }

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(PathTransformer::relative_to(cwd))
}

/// Drop rows whose file path matches any of the user's exclude patterns.
/// Patterns are matched against the slash-normalized full path and, for
/// simple patterns, against the bare file name.
fn filter_excluded(rows: Vec<MissingCoverageRow>, patterns: &[String]) -> Result<Vec<MissingCoverageRow>> {
    let compiled: Vec<glob::Pattern> = patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern '{p}'"))
        })
        .collect::<Result<_>>()?;

    Ok(rows
        .into_iter()
        .filter(|row| !is_excluded(&row.file, &compiled))
        .collect())
}

fn is_excluded(file: &str, patterns: &[glob::Pattern]) -> bool {
    let normalized = file.replace('\\', "/");
    let file_name = Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    patterns
        .iter()
        .any(|p| p.matches(&normalized) || p.matches(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(file: &str) -> MissingCoverageRow {
        MissingCoverageRow {
            file: file.to_string(),
            class_name: "C".to_string(),
            method: None,
            line_numbers: vec![1],
            hits: 0,
            branch_coverage: None,
            branch_conditions: None,
        }
    }

    #[test]
    fn test_filter_excluded_by_full_path() {
        let rows = vec![row("src/gen/File.g.cs"), row("src/File.cs")];
        let kept = filter_excluded(rows, &["src/gen/*".to_string()]).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].file, "src/File.cs");
    }

    #[test]
    fn test_filter_excluded_by_file_name() {
        let rows = vec![row("deep/nested/File.g.cs"), row("deep/nested/File.cs")];
        let kept = filter_excluded(rows, &["*.g.cs".to_string()]).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].file, "deep/nested/File.cs");
    }

    #[test]
    fn test_filter_excluded_normalizes_backslashes() {
        let rows = vec![row("src\\gen\\File.cs")];
        let kept = filter_excluded(rows, &["src/gen/*".to_string()]).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_filter_excluded_invalid_pattern() {
        assert!(filter_excluded(vec![row("a.cs")], &["[".to_string()]).is_err());
    }
}
