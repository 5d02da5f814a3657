//! Full validation: schema shape first, then cross-references

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::schema::validate_schema;
use crate::semantic::validate_semantic;

/// Combined outcome of schema and semantic validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub success: bool,
    pub schema_errors: Vec<String>,
    pub semantic_errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate the registry at `document_path` against `schema_path`
///
/// The semantic pass runs even when the schema pass fails. Warnings never
/// affect `success`.
pub fn validate(document_path: &Path, schema_path: &Path) -> ValidationResult {
    let schema_errors = validate_schema(document_path, schema_path);
    let semantic = validate_semantic(document_path);

    let result = ValidationResult {
        success: schema_errors.is_empty() && semantic.errors.is_empty(),
        schema_errors,
        semantic_errors: semantic.errors,
        warnings: semantic.warnings,
    };
    info!(
        path = %document_path.display(),
        success = result.success,
        schema_errors = result.schema_errors.len(),
        semantic_errors = result.semantic_errors.len(),
        warnings = result.warnings.len(),
        "validation finished"
    );
    result
}
