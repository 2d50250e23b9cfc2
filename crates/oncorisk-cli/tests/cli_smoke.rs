//! CLI binary smoke tests using assert_cmd.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("oncorisk").unwrap()
}

fn write_risk_csv(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("risk_factors.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Age,Smokes,Dx:Cancer,Dx").unwrap();
    for i in 0..60usize {
        let cancer = i % 4 == 0;
        let age = (if cancer { 40 } else { 25 }) + (i * 7) % 19;
        let smokes = if i % 9 == 0 { "?".to_string() } else { ((i * 5) % 3).to_string() };
        let code = if cancer { 1 } else { 0 };
        writeln!(file, "{},{},{},{}", age, smokes, code, code).unwrap();
    }
    path
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("oncorisk"));
}

#[test]
fn config_prints_defaults() {
    cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"train_fraction\""))
        .stdout(predicate::str::contains("\"k_neighbors\""));
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

#[test]
fn analyze_requires_data() {
    cmd().arg("analyze").assert().failure();
}

#[test]
fn analyze_nonexistent_data_errors() {
    cmd()
        .args(["analyze", "/nonexistent/risk_factors.csv"])
        .assert()
        .failure();
}

#[test]
fn analyze_rejects_unknown_model_type() {
    cmd()
        .args(["analyze", "data.csv", "--model-type", "svm"])
        .assert()
        .failure();
}

#[test]
fn analyze_prints_table_and_writes_summary() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_risk_csv(dir.path());
    let summary = dir.path().join("summary.json");

    cmd()
        .arg("analyze")
        .arg(&data)
        .args(["--model-type", "random_forest", "--seed", "5", "--standardization", "reference"])
        .arg("-o")
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("RandomForest"));

    let json = std::fs::read_to_string(&summary).unwrap();
    assert!(json.contains("\"generated_at\""));
    assert!(json.contains("\"roc\""));
}
