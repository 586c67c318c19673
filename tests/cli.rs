//! Integration tests driving the covgaps binary.

use std::path::Path;
use std::process::{Command, Output};

fn covgaps(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_covgaps"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run covgaps")
}

fn write_fixture(dir: &Path, name: &str, content: &[u8]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn reports_missing_coverage_as_table() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(
        dir.path(),
        "coverage.xml",
        include_bytes!("fixtures/sample_cobertura.xml"),
    );

    let output = covgaps(&[&file], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines[0],
        "File|Class|Method|Lines|Hits|BranchCoverage|BranchConditions"
    );
    assert!(lines[1].starts_with("src/Calculator.cs|App.Calculator|Add|[11]|0||"));
    assert!(lines[2].contains("|[12]|0|50% (1/2)|"));
}

#[test]
fn prints_ok_when_nothing_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(
        dir.path(),
        "coverage.xml",
        include_bytes!("fixtures/cobertura_all_covered.xml"),
    );

    let output = covgaps(&[&file], dir.path());

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "Code coverage OK\n");
}

#[test]
fn merges_multiple_inputs_before_reporting() {
    let dir = tempfile::tempdir().unwrap();
    let run1 = write_fixture(
        dir.path(),
        "run1.xml",
        include_bytes!("fixtures/sample_cobertura.xml"),
    );
    let run2 = write_fixture(
        dir.path(),
        "run2.xml",
        include_bytes!("fixtures/sample_cobertura_run2.xml"),
    );

    let output = covgaps(&[&run1, &run2], dir.path());

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "Code coverage OK\n");
}

#[test]
fn expands_glob_patterns() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(
        dir.path(),
        "run1.xml",
        include_bytes!("fixtures/sample_cobertura.xml"),
    );
    write_fixture(
        dir.path(),
        "run2.xml",
        include_bytes!("fixtures/sample_cobertura_run2.xml"),
    );

    let output = covgaps(&["*.xml", "--verbose"], dir.path());

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Processing 2 file(s):"));
    assert!(stderr.contains("Merged 2 report(s)."));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "Code coverage OK\n");
}

#[test]
fn missing_file_fails_with_lookup_error() {
    let dir = tempfile::tempdir().unwrap();

    let output = covgaps(&["nope.xml"], dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("File not found: nope.xml"));
}

#[test]
fn unmatched_glob_fails_with_lookup_error() {
    let dir = tempfile::tempdir().unwrap();

    let output = covgaps(&["*.xml"], dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("No files matched the pattern: *.xml"));
}

#[test]
fn malformed_input_reports_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "broken.xml", b"<report></report>");

    let output = covgaps(&[&file], dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Failed to parse"));
    assert!(stderr.contains("broken.xml"));
}

#[test]
fn json_output_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(
        dir.path(),
        "coverage.xml",
        include_bytes!("fixtures/sample_cobertura.xml"),
    );

    let output = covgaps(
        &[&file, "--output", "json", "--limit", "1", "--verbose"],
        dir.path(),
    );

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Showing first 1 of 2 rows."));
}

#[test]
fn exclude_patterns_drop_rows() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(
        dir.path(),
        "coverage.xml",
        include_bytes!("fixtures/sample_cobertura.xml"),
    );

    let output = covgaps(&[&file, "--exclude", "src/*"], dir.path());

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "Code coverage OK\n");
}

#[test]
fn base_path_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(
        dir.path(),
        "coverage.xml",
        include_bytes!("fixtures/sample_cobertura.xml"),
    );

    let output = covgaps(&[&file, "--base-path", "no-such-dir"], dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Base path directory does not exist"));
}

#[test]
fn absolute_paths_conflicts_with_base_path() {
    let dir = tempfile::tempdir().unwrap();

    let output = covgaps(
        &["x.xml", "--absolute-paths", "--base-path", "."],
        dir.path(),
    );

    assert!(!output.status.success());
}
