//! Entry listing with optional category and tier filters

use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;

use crate::document::scalar_text;
use crate::error::DocumentError;
use crate::store;

/// Exact-match filters; `None` matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub category: Option<String>,
    pub tier: Option<String>,
}

/// Summary of one entry as shown by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tier: Option<String>,
    pub tags: Vec<String>,
    pub features: Vec<String>,
}

impl EntrySummary {
    fn from_entry(entry: &Value) -> Self {
        let text = |key: &str| entry.get(key).and_then(scalar_text);
        let list = |key: &str| match entry.get(key) {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_text).collect(),
            _ => Vec::new(),
        };
        Self {
            id: text("id"),
            title: text("title"),
            description: text("description"),
            category: text("category"),
            tier: text("tier"),
            tags: list("tags"),
            features: list("features"),
        }
    }
}

/// Entries of the registry at `path` that match `filter`, in document order
pub fn list_entries(path: &Path, filter: &ListFilter) -> Result<Vec<EntrySummary>, DocumentError> {
    let document = store::load(path)?;
    Ok(document
        .templates()
        .iter()
        .filter(|entry| entry.is_mapping())
        .map(EntrySummary::from_entry)
        .filter(|summary| {
            filter.category.is_none() || summary.category == filter.category
        })
        .filter(|summary| filter.tier.is_none() || summary.tier == filter.tier)
        .collect())
}
