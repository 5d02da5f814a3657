//! Runs the built binary end to end

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::tempdir;

const REGISTRY: &str = r#"version: "1.0"
categories:
  - id: backend
    name: Backend
templates: []
"#;

fn schema_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates.schema.yaml")
}

fn manager(args: &[&str], templates: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_template-manager"))
        .args(args)
        .env("TEMPLATES_PATH", templates)
        .env("TEMPLATES_SCHEMA_PATH", schema_path())
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn test_add_then_validate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("templates.yaml");
    fs::write(&path, REGISTRY).unwrap();

    let added = manager(
        &[
            "add",
            "--id",
            "svc",
            "--repo",
            "acme/svc",
            "--title",
            "Service",
            "--description",
            "A service",
            "--category",
            "backend",
            "--tier",
            "beta",
        ],
        &path,
    );
    assert!(added.status.success(), "{added:?}");

    let validated = manager(&["validate"], &path);
    assert!(validated.status.success(), "{validated:?}");
    let stdout = String::from_utf8(validated.stdout).unwrap();
    assert!(stdout.starts_with("Validation passed:"));
}

#[test]
fn test_failed_mutation_exits_nonzero() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("templates.yaml");
    fs::write(&path, REGISTRY).unwrap();

    let output = manager(&["remove", "ghost"], &path);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error: Template 'ghost' not found"));
    assert_eq!(fs::read_to_string(&path).unwrap(), REGISTRY);
}

#[test]
fn test_missing_registry_exits_nonzero() {
    let dir = tempdir().unwrap();
    let output = manager(&["list"], &dir.path().join("missing.yaml"));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error: Templates file not found:"));
}

#[test]
fn test_list_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("templates.yaml");
    fs::write(&path, REGISTRY).unwrap();

    let output = manager(&["list", "--format", "json"], &path);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json, serde_json::json!([]));
}
