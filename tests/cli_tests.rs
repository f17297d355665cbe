//! Integration tests for the Kage CLI
//!
//! These tests run the actual CLI binary and verify output.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

/// Get the binary to test
fn kage_cmd() -> Command {
    Command::cargo_bin("kage").unwrap()
}

fn write_project(dir: &TempDir, manifest: Value, with_entry: bool) {
    fs::write(
        dir.path().join("doubler.node.json"),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
    if with_entry {
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
    }
}

fn manifest(language: &str) -> Value {
    json!({
        "name": "doubler",
        "version": "0.2.0",
        "type": "node",
        "model": {
            "execution_model": {
                "language": language,
                "input_schema": {"n": "integer"},
                "output_schema": {"result": {"type": "object", "properties": {"value": "integer"}}}
            },
            "source": "src",
            "entry_file": "src/main.rs"
        },
        "metadata": {"description": "Doubles a number"}
    })
}

#[test]
fn test_help_flag() {
    kage_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("schema-driven function orchestration"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_version_command() {
    kage_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Node validation
// ============================================================================

#[test]
fn test_validate_valid_node() {
    let temp_dir = TempDir::new().unwrap();
    write_project(&temp_dir, manifest("rust"), true);

    kage_cmd()
        .args(["validate", "--dir", temp_dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kage node is valid"))
        .stdout(predicate::str::contains("doubler"))
        .stdout(predicate::str::contains("0.2.0"))
        .stdout(predicate::str::contains("Doubles a number"));
}

#[test]
fn test_validate_missing_entry_file() {
    let temp_dir = TempDir::new().unwrap();
    write_project(&temp_dir, manifest("rust"), false);

    kage_cmd()
        .args(["validate", "--dir", temp_dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid Kage node"));
}

#[test]
fn test_validate_unsupported_language() {
    let temp_dir = TempDir::new().unwrap();
    write_project(&temp_dir, manifest("cobol"), true);

    kage_cmd()
        .args(["validate", "--dir", temp_dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("language: cobol"));
}

#[test]
fn test_validate_without_manifest() {
    let temp_dir = TempDir::new().unwrap();

    kage_cmd()
        .args(["validate", "--dir", temp_dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KAGE-040"))
        .stderr(predicate::str::contains(".node.json not found"));
}

#[test]
fn test_validate_malformed_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let mut broken = manifest("rust");
    broken.as_object_mut().unwrap().remove("model");
    write_project(&temp_dir, broken, true);

    kage_cmd()
        .args(["validate", "--dir", temp_dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Required field 'model' missing"));
}

// ============================================================================
// Node info
// ============================================================================

#[test]
fn test_info_prints_json() {
    let temp_dir = TempDir::new().unwrap();
    write_project(&temp_dir, manifest("rust"), true);

    let output = kage_cmd()
        .args(["info", "--dir", temp_dir.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let info: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["name"], "doubler");
    assert_eq!(info["version"], "0.2.0");
    assert_eq!(info["valid"], true);
    assert_eq!(info["input_schema"], json!({"n": "integer"}));
}
