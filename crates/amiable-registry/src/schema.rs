//! Shape validation of the registry against a Draft-07 schema document
//!
//! Both documents are converted to plain JSON before validation. Schema
//! references are only ever resolved inside the schema document itself: any
//! `$ref` pointing elsewhere is reported instead of fetched, and the
//! validator is built without its network and file resolvers.

use std::path::Path;

use jsonschema::Draft;
use serde_json::Value;
use tracing::debug;

use crate::document::RegistryDocument;
use crate::store;

/// Validate the registry at `document_path` against `schema_path`
///
/// Returns one message per violation; an empty list means the document
/// conforms. Unreadable input is reported as a single message.
pub fn validate_schema(document_path: &Path, schema_path: &Path) -> Vec<String> {
    let document = match store::load(document_path) {
        Ok(document) => document,
        Err(err) => return vec![format!("Failed to load YAML: {err}")],
    };
    let schema = match store::load(schema_path) {
        Ok(schema) => schema,
        Err(err) => return vec![format!("Failed to load YAML: {err}")],
    };
    check_schema(&document, &schema)
}

/// Validate an already loaded document against an already loaded schema
pub fn check_schema(document: &RegistryDocument, schema: &RegistryDocument) -> Vec<String> {
    let schema = schema.to_json();
    let instance = document.to_json();

    let mut remote = Vec::new();
    collect_remote_refs(&schema, &mut remote);
    if !remote.is_empty() {
        return remote
            .into_iter()
            .map(|uri| format!("Remote $ref resolution disabled for security: {uri}"))
            .collect();
    }

    let validator = match jsonschema::options().with_draft(Draft::Draft7).build(&schema) {
        Ok(validator) => validator,
        Err(err) => return vec![format!("Invalid schema: {err}")],
    };

    let errors: Vec<String> = validator
        .iter_errors(&instance)
        .map(|err| {
            let path = dotted_path(&err.instance_path.to_string());
            format!("Schema error at {path}: {err}")
        })
        .collect();
    debug!(errors = errors.len(), "schema validation finished");
    errors
}

/// Every `$ref` that does not point into the schema document itself
fn collect_remote_refs(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(uri)) if !uri.starts_with('#') => {
                        found.push(uri.clone());
                    }
                    _ => collect_remote_refs(child, found),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_remote_refs(item, found)),
        _ => {}
    }
}

/// Turn a JSON pointer (`/templates/0/title`) into `templates.0.title`
fn dotted_path(pointer: &str) -> String {
    let segments: Vec<String> = pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect();
    if segments.is_empty() {
        "root".to_string()
    } else {
        segments.join(".")
    }
}
