//! Validation tests against the repository schema

use amiable_registry::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn repo_file(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(name)
}

fn schema_path() -> PathBuf {
    repo_file("templates.schema.yaml")
}

fn write_registry(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("templates.yaml");
    fs::write(&path, content).unwrap();
    path
}

const VALID: &str = r#"# yaml-language-server: $schema=./templates.schema.yaml
version: "1.0"

categories:
  - id: test-category
    name: "Test Category"
    icon: "material/test"
    description: "Test category for testing"

templates:
  - id: test-template
    repo:
      owner: "test-org"
      name: "test-repo"
    title: "Test Template"
    description: "A test template for validation"
    category: test-category
    tier: starter
    directories:
      docs:
        - path: "README.md"
          target: "overview.md"
          sidebar_label: "Overview"
    links:
      github: "https://github.com/test-org/test-repo"
    features:
      - "Feature 1"
      - "Feature 2"
"#;

const MISSING_REQUIRED: &str = r#"version: "1.0"

templates:
  - id: test-template
    repo:
      owner: "test-org"
      name: "test-repo"
    # Missing: title, description, category, directories
"#;

const DUPLICATE_IDS: &str = r#"version: "1.0"

categories:
  - id: test-category
    name: "Test Category"

templates:
  - id: duplicate-id
    repo:
      owner: "test-org"
      name: "test-repo"
    title: "First Template"
    description: "First template"
    category: test-category
    directories:
      docs:
        - path: "README.md"
          target: "overview.md"

  - id: duplicate-id
    repo:
      owner: "test-org"
      name: "test-repo2"
    title: "Second Template"
    description: "Second template with same ID"
    category: test-category
    directories:
      docs:
        - path: "README.md"
          target: "overview.md"
"#;

const UNKNOWN_CATEGORY: &str = r#"version: "1.0"

categories:
  - id: existing-category
    name: "Existing Category"

templates:
  - id: test-template
    repo:
      owner: "test-org"
      name: "test-repo"
    title: "Test Template"
    description: "Template referencing non-existent category"
    category: nonexistent-category
    directories:
      docs:
        - path: "README.md"
          target: "overview.md"
"#;

const BAD_ID: &str = r#"version: "1.0"

categories:
  - id: test-category
    name: "Test Category"

templates:
  - id: Invalid_ID_With_Uppercase
    repo:
      owner: "test-org"
      name: "test-repo"
    title: "Test Template"
    description: "Template with invalid ID"
    category: test-category
    directories:
      docs:
        - path: "README.md"
          target: "overview.md"
"#;

const HTTP_URL: &str = r#"version: "1.0"

categories:
  - id: test-category
    name: "Test Category"

templates:
  - id: test-template
    repo:
      owner: "test-org"
      name: "test-repo"
    title: "Test Template"
    description: "Template with HTTP URL"
    category: test-category
    directories:
      docs:
        - path: "README.md"
          target: "overview.md"
    links:
      github: "http://github.com/test-org/test-repo"
"#;

#[test]
fn test_valid_registry_passes() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), VALID);
    let result = validate(&path, &schema_path());
    assert!(result.success, "{result:?}");
    assert!(result.schema_errors.is_empty());
    assert!(result.semantic_errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_repository_registry_is_valid() {
    let result = validate(&repo_file("templates.yaml"), &schema_path());
    assert!(result.success, "{result:?}");
}

#[test]
fn test_missing_required_fields_fail_schema() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), MISSING_REQUIRED);
    let result = validate(&path, &schema_path());
    assert!(!result.success);
    for field in ["title", "description", "category", "directories"] {
        assert!(
            result
                .schema_errors
                .iter()
                .any(|e| e.starts_with("Schema error at templates.0:") && e.contains(field)),
            "no error for {field}: {:?}",
            result.schema_errors
        );
    }
}

#[test]
fn test_duplicate_ids_fail_semantics() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), DUPLICATE_IDS);
    let result = validate(&path, &schema_path());
    assert!(!result.success);
    assert!(result.schema_errors.is_empty(), "{:?}", result.schema_errors);
    assert_eq!(result.semantic_errors.len(), 1);
    assert!(result.semantic_errors[0].contains("Duplicate template ID: 'duplicate-id'"));
}

#[test]
fn test_unknown_category_fails_semantics() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), UNKNOWN_CATEGORY);
    let result = validate(&path, &schema_path());
    assert!(!result.success);
    assert_eq!(
        result.semantic_errors,
        vec!["Template 'test-template' references non-existent category: 'nonexistent-category'"]
    );
}

#[test]
fn test_invalid_id_pattern_fails_schema() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), BAD_ID);
    let result = validate(&path, &schema_path());
    assert!(!result.success);
    assert!(
        result
            .schema_errors
            .iter()
            .any(|e| e.starts_with("Schema error at templates.0.id:")),
        "{:?}",
        result.schema_errors
    );
}

#[test]
fn test_http_url_warns_without_failing() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), HTTP_URL);
    let result = validate(&path, &schema_path());
    assert!(result.success, "{result:?}");
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("http://github.com/test-org/test-repo"));
    assert!(result.warnings[0].contains("HTTPS"));
}

#[test]
fn test_list_root_is_reported_not_raised() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), "- id: a\n- id: b\n");
    let result = validate(&path, &schema_path());
    assert!(!result.success);
    assert!(
        result.schema_errors.iter().any(|e| e.contains("dictionary")),
        "{:?}",
        result.schema_errors
    );
    assert!(result.semantic_errors.iter().any(|e| e.contains("dictionary")));
}

#[test]
fn test_json_registry_is_accepted() {
    let dir = tempdir().unwrap();
    let path = write_registry(
        dir.path(),
        r#"{"version": "1.0", "categories": [], "templates": []}"#,
    );
    let result = validate(&path, &schema_path());
    assert!(result.success, "{result:?}");
}

#[test]
fn test_empty_file_fails_required_fields() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), "");
    let result = validate(&path, &schema_path());
    assert!(!result.success);
    assert!(result.semantic_errors.is_empty());
    assert!(result.schema_errors.iter().all(|e| e.starts_with("Schema error at root:")));
}

#[test]
fn test_null_collections_pass_semantics() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), "version: \"1.0\"\ncategories: null\ntemplates: null\n");
    let report = validate_semantic(&path);
    assert_eq!(report, SemanticReport::default());
}

#[test]
fn test_dates_are_compared_as_strings() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), "version: 2024-01-15\ntemplates: []\n");
    let result = validate(&path, &schema_path());
    assert!(result.success, "{result:?}");
}

#[test]
fn test_remote_schema_reference_refused() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), VALID);
    let schema = dir.path().join("schema.yaml");
    fs::write(
        &schema,
        "type: object\nproperties:\n  templates:\n    $ref: \"http://169.254.169.254/latest/meta-data\"\n",
    )
    .unwrap();
    let errors = validate_schema(&path, &schema);
    assert_eq!(
        errors,
        vec!["Remote $ref resolution disabled for security: http://169.254.169.254/latest/meta-data"]
    );
}

#[test]
fn test_validation_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = write_registry(dir.path(), DUPLICATE_IDS);
    let first = validate(&path, &schema_path());
    let second = validate(&path, &schema_path());
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&path).unwrap(), DUPLICATE_IDS);
}

#[cfg(unix)]
#[test]
fn test_symlinked_registry_is_rejected() {
    let dir = tempdir().unwrap();
    let real = write_registry(dir.path(), VALID);
    let link = dir.path().join("link.yaml");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let result = validate(&link, &schema_path());
    assert!(!result.success);
    assert!(result.schema_errors[0].contains("symlink"));
}
