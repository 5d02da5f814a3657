//! Add, update and remove registry entries
//!
//! Each operation validates everything it can in memory, edits the styled
//! document, and only then performs a single atomic write. Pre-condition
//! failures come back as an unsuccessful [`WriteResult`]; only failures of
//! the write itself are returned as errors.

use std::path::Path;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::document::{StyledDocument, scalar_text};
use crate::error::{MutationError, Result};
use crate::model::Tier;
use crate::patterns::{
    DEFAULT_DOC_PATH, DEFAULT_DOC_TARGET, ENTRY_ID, REPO_NAME, REPO_OWNER, github_url,
};
use crate::store;

/// Outcome of a mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl WriteResult {
    fn written() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }
}

impl From<MutationError> for WriteResult {
    fn from(err: MutationError) -> Self {
        let message = err.to_string();
        match err {
            // A blocked removal is advice to the caller, not a failure of the document.
            MutationError::Referenced { .. } => Self {
                success: false,
                errors: Vec::new(),
                warnings: vec![message],
            },
            _ => Self {
                success: false,
                errors: vec![message],
                warnings: Vec::new(),
            },
        }
    }
}

/// Fields of an entry to be added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub id: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tier: Tier,
    pub tags: Vec<String>,
    pub features: Vec<String>,
}

impl NewEntry {
    pub fn new(
        id: impl Into<String>,
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            tier: Tier::default(),
            tags: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    /// The entry as it is written to the document
    fn to_mapping(&self) -> Mapping {
        let mut repo = Mapping::new();
        repo.insert("owner".into(), self.repo_owner.as_str().into());
        repo.insert("name".into(), self.repo_name.as_str().into());

        let mut doc = Mapping::new();
        doc.insert("path".into(), DEFAULT_DOC_PATH.into());
        doc.insert("target".into(), DEFAULT_DOC_TARGET.into());
        let mut directories = Mapping::new();
        directories.insert("docs".into(), Value::Sequence(vec![Value::Mapping(doc)]));

        let mut links = Mapping::new();
        links.insert(
            "github".into(),
            github_url(&self.repo_owner, &self.repo_name).into(),
        );

        let mut entry = Mapping::new();
        entry.insert("id".into(), self.id.as_str().into());
        entry.insert("repo".into(), Value::Mapping(repo));
        entry.insert("title".into(), self.title.as_str().into());
        entry.insert("description".into(), self.description.as_str().into());
        entry.insert("category".into(), self.category.as_str().into());
        entry.insert("tier".into(), self.tier.as_str().into());
        entry.insert("directories".into(), Value::Mapping(directories));
        if !self.tags.is_empty() {
            entry.insert("tags".into(), string_list(&self.tags));
        }
        if !self.features.is_empty() {
            entry.insert("features".into(), string_list(&self.features));
        }
        entry.insert("links".into(), Value::Mapping(links));
        entry
    }
}

/// Fields to change on an existing entry; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tier: Option<Tier>,
    pub tags: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
}

impl EntryUpdate {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::new();
        if let Some(title) = &self.title {
            fields.push(("title", Value::from(title.as_str())));
        }
        if let Some(description) = &self.description {
            fields.push(("description", Value::from(description.as_str())));
        }
        if let Some(category) = &self.category {
            fields.push(("category", Value::from(category.as_str())));
        }
        if let Some(tier) = self.tier {
            fields.push(("tier", Value::from(tier.as_str())));
        }
        if let Some(tags) = &self.tags {
            fields.push(("tags", string_list(tags)));
        }
        if let Some(features) = &self.features {
            fields.push(("features", string_list(features)));
        }
        fields
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Sequence(items.iter().map(|item| Value::from(item.as_str())).collect())
}

/// Add `entry` to the registry at `path`
pub fn add_entry(path: &Path, entry: &NewEntry) -> Result<WriteResult> {
    match prepare_add(path, entry) {
        Ok(document) => {
            store::save(path, &document)?;
            info!(id = %entry.id, path = %path.display(), "added template entry");
            Ok(WriteResult::written())
        }
        Err(err) => {
            debug!(id = %entry.id, error = %err, "add rejected");
            Ok(err.into())
        }
    }
}

fn prepare_add(path: &Path, entry: &NewEntry) -> std::result::Result<StyledDocument, MutationError> {
    if !ENTRY_ID.is_match(&entry.id) {
        return Err(MutationError::InvalidId(entry.id.clone()));
    }
    if !REPO_OWNER.is_match(&entry.repo_owner) {
        return Err(MutationError::InvalidOwner(entry.repo_owner.clone()));
    }
    if !REPO_NAME.is_match(&entry.repo_name) {
        return Err(MutationError::InvalidRepoName(entry.repo_name.clone()));
    }

    let mut document = store::load_styled(path).map_err(MutationError::Load)?;
    if document.data().entry_index(&entry.id).is_some() {
        return Err(MutationError::DuplicateId(entry.id.clone()));
    }
    if !document.data().category_ids().contains(&entry.category) {
        return Err(MutationError::UnknownCategory(entry.category.clone()));
    }

    document
        .append_entry(entry.to_mapping())
        .map_err(MutationError::Edit)?;
    Ok(document)
}

/// Apply `update` to the entry `id` in the registry at `path`
///
/// Either every supplied field is applied or none is.
pub fn update_entry(path: &Path, id: &str, update: &EntryUpdate) -> Result<WriteResult> {
    match prepare_update(path, id, update) {
        Ok(document) => {
            store::save(path, &document)?;
            info!(id, path = %path.display(), "updated template entry");
            Ok(WriteResult::written())
        }
        Err(err) => {
            debug!(id, error = %err, "update rejected");
            Ok(err.into())
        }
    }
}

fn prepare_update(
    path: &Path,
    id: &str,
    update: &EntryUpdate,
) -> std::result::Result<StyledDocument, MutationError> {
    let mut document = store::load_styled(path).map_err(MutationError::Load)?;
    let index = document
        .data()
        .entry_index(id)
        .ok_or_else(|| MutationError::NotFound(id.to_string()))?;
    if let Some(category) = &update.category {
        if !document.data().category_ids().contains(category) {
            return Err(MutationError::UnknownCategory(category.clone()));
        }
    }

    for (key, value) in update.fields() {
        document
            .set_entry_field(index, key, value)
            .map_err(MutationError::Edit)?;
    }
    Ok(document)
}

/// Remove the entry `id` from the registry at `path`
///
/// Unless `force` is set, an entry that other entries relate to is kept and
/// the result lists the referring entries as a warning.
pub fn remove_entry(path: &Path, id: &str, force: bool) -> Result<WriteResult> {
    match prepare_remove(path, id, force) {
        Ok(document) => {
            store::save(path, &document)?;
            info!(id, path = %path.display(), "removed template entry");
            Ok(WriteResult::written())
        }
        Err(err) => {
            debug!(id, error = %err, "remove rejected");
            Ok(err.into())
        }
    }
}

fn prepare_remove(
    path: &Path,
    id: &str,
    force: bool,
) -> std::result::Result<StyledDocument, MutationError> {
    let mut document = store::load_styled(path).map_err(MutationError::Load)?;
    let index = document
        .data()
        .entry_index(id)
        .ok_or_else(|| MutationError::NotFound(id.to_string()))?;

    if !force {
        let referrers = referrers_of(&document, id, index);
        if !referrers.is_empty() {
            return Err(MutationError::Referenced {
                id: id.to_string(),
                referrers,
            });
        }
    }

    document.remove_entry(index).map_err(MutationError::Edit)?;
    Ok(document)
}

/// IDs of entries, other than the one at `own_index`, relating to `id`
fn referrers_of(document: &StyledDocument, id: &str, own_index: usize) -> Vec<String> {
    document
        .data()
        .templates()
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != own_index)
        .filter_map(|(_, entry)| {
            let relations = entry.get("relates_to")?.as_sequence()?;
            let refers = relations.iter().any(|relation| {
                relation
                    .get("template_id")
                    .and_then(Value::as_str)
                    .is_some_and(|target| target == id)
            });
            refers.then(|| {
                entry
                    .get("id")
                    .and_then(scalar_text)
                    .unwrap_or_else(|| "<unknown>".to_string())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const REGISTRY: &str = r#"version: "1.0"
categories:
  - id: web
    name: Web
templates:
  - id: base
    repo:
      owner: o
      name: base
    title: Base
    description: Base template
    category: web
  - id: child
    repo:
      owner: o
      name: child
    title: Child
    description: Child template
    category: web
    relates_to:
      - template_id: base
        relationship: extends
"#;

    fn registry() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("templates.yaml");
        fs::write(&path, REGISTRY).unwrap();
        (dir, path)
    }

    #[test]
    fn test_new_entry_mapping_layout() {
        let entry = NewEntry::new("demo", "o", "r", "T", "D", "web")
            .with_tags(vec!["a".into()])
            .with_tier(Tier::Beta);
        let keys: Vec<_> = entry
            .to_mapping()
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect();
        assert_eq!(
            keys,
            vec!["id", "repo", "title", "description", "category", "tier", "directories", "tags", "links"]
        );
        let mapping = entry.to_mapping();
        assert_eq!(
            mapping.get("links").and_then(|l| l.get("github")),
            Some(&Value::from("https://github.com/o/r"))
        );
        assert_eq!(mapping.get("tier"), Some(&Value::from("beta")));
    }

    #[test]
    fn test_validation_order_short_circuits() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        // Identifier checks fail before the (missing) file is touched.
        let result = add_entry(&missing, &NewEntry::new("Bad", "-o", "r", "t", "d", "c")).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("pattern"));

        let result = add_entry(&missing, &NewEntry::new("ok", "-o", "r", "t", "d", "c")).unwrap();
        assert!(result.errors[0].starts_with("Invalid repo owner"));

        let result =
            add_entry(&missing, &NewEntry::new("ok", "o", "bad name", "t", "d", "c")).unwrap();
        assert!(result.errors[0].starts_with("Invalid repo name"));

        let result = add_entry(&missing, &NewEntry::new("ok", "o", "r", "t", "d", "c")).unwrap();
        assert!(result.errors[0].starts_with("Failed to load YAML:"));
        assert!(!missing.exists());
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let (_dir, path) = registry();
        let result =
            add_entry(&path, &NewEntry::new("base", "o", "r", "t", "d", "web")).unwrap();
        assert_eq!(result.errors, vec!["Template with ID 'base' already exists"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), REGISTRY);
    }

    #[test]
    fn test_update_unknown_category_applies_nothing() {
        let (_dir, path) = registry();
        let update = EntryUpdate {
            title: Some("Changed".into()),
            category: Some("missing".into()),
            ..EntryUpdate::default()
        };
        let result = update_entry(&path, "base", &update).unwrap();
        assert!(!result.success);
        assert_eq!(result.errors, vec!["Category 'missing' does not exist"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), REGISTRY);
    }

    #[test]
    fn test_update_not_found() {
        let (_dir, path) = registry();
        let result = update_entry(&path, "ghost", &EntryUpdate::default()).unwrap();
        assert_eq!(result.errors, vec!["Template 'ghost' not found"]);
    }

    #[test]
    fn test_remove_blocked_by_reference() {
        let (_dir, path) = registry();
        let result = remove_entry(&path, "base", false).unwrap();
        assert!(!result.success);
        assert!(result.errors.is_empty());
        assert_eq!(
            result.warnings,
            vec!["Template 'base' is referenced by: child. Use --force to remove anyway."]
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), REGISTRY);
    }

    #[test]
    fn test_remove_ignores_self_reference() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("templates.yaml");
        fs::write(
            &path,
            "templates:\n  - id: loop\n    relates_to:\n      - template_id: loop\n",
        )
        .unwrap();
        let result = remove_entry(&path, "loop", false).unwrap();
        assert!(result.success, "{result:?}");
        assert_eq!(fs::read_to_string(&path).unwrap(), "templates: []\n");
    }
}
