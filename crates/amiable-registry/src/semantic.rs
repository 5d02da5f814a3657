//! Cross-reference rules that a shape schema cannot express
//!
//! All entries are checked in one pass after the lookup sets are built, so
//! every violation in the document is reported together.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;

use crate::document::{RegistryDocument, scalar_text, type_name};
use crate::patterns::INSECURE_SCHEME;
use crate::store;

/// Errors and policy warnings found by the semantic pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SemanticReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Load `path` and check its cross-references
pub fn validate_semantic(path: &Path) -> SemanticReport {
    match store::load(path) {
        Ok(document) => check_semantics(&document),
        Err(err) => SemanticReport {
            errors: vec![format!("Failed to load YAML: {err}")],
            warnings: Vec::new(),
        },
    }
}

/// Like [`validate_semantic`], without the warnings
pub fn semantic_errors(path: &Path) -> Vec<String> {
    validate_semantic(path).errors
}

/// Check a loaded document
pub fn check_semantics(document: &RegistryDocument) -> SemanticReport {
    let mut report = SemanticReport::default();

    let mut category_ids = HashSet::new();
    for category in document.categories() {
        let Some(id) = category.get("id").and_then(scalar_text) else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        if !category_ids.insert(id.clone()) {
            report.errors.push(format!("Duplicate category ID: '{id}'"));
        }
    }

    let templates = document.templates();
    let entry_ids: HashSet<String> = templates
        .iter()
        .filter_map(|entry| entry.get("id").and_then(scalar_text))
        .collect();
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (index, entry) in templates.iter().enumerate() {
        let Value::Mapping(fields) = entry else {
            report
                .errors
                .push(format!("Template at index {index} is not a valid object"));
            continue;
        };
        let id = fields
            .get("id")
            .and_then(scalar_text)
            .unwrap_or_else(|| format!("<unknown at index {index}>"));

        match first_seen.get(&id) {
            Some(first) => report.errors.push(format!(
                "Duplicate template ID: '{id}' (index {index}, first defined at index {first})"
            )),
            None => {
                first_seen.insert(id.clone(), index);
            }
        }

        if let Some(category) = fields.get("category").and_then(scalar_text) {
            if !category.is_empty() && !category_ids.contains(&category) {
                report.errors.push(format!(
                    "Template '{id}' references non-existent category: '{category}'"
                ));
            }
        }

        if let Some(Value::Sequence(relations)) = fields.get("relates_to") {
            for (idx, relation) in relations.iter().enumerate() {
                if !relation.is_mapping() {
                    report.errors.push(format!(
                        "Template '{id}' has invalid relates_to entry at index {idx}: expected mapping, got {}",
                        type_name(relation)
                    ));
                    continue;
                }
                let Some(target) = relation.get("template_id").and_then(scalar_text) else {
                    continue;
                };
                if !target.is_empty() && !entry_ids.contains(&target) {
                    report.errors.push(format!(
                        "Template '{id}' relates_to non-existent template: '{target}'"
                    ));
                }
            }
        }

        if let Some(Value::Mapping(links)) = fields.get("links") {
            for (name, url) in links {
                let Some(url) = url.as_str() else { continue };
                if url.starts_with(INSECURE_SCHEME) {
                    let name = scalar_text(name).unwrap_or_default();
                    report.warnings.push(format!(
                        "Template '{id}' has insecure URL in {name}: {url} (should be HTTPS)"
                    ));
                }
            }
        }
    }

    report
}
