//! Typed, read-only view of a registry document
//!
//! Validators and mutators work on the raw document so they can report on
//! malformed input; collaborators that only consume well-formed entries
//! (such as the documentation aggregator) use these types instead.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use tracing::warn;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Fall back to the default when the value has an unexpected shape
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_value(raw).unwrap_or_else(|err| {
        warn!(error = %err, "ignoring malformed registry section");
        T::default()
    }))
}

/// Maturity tier of an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Starter,
    Production,
    Stable,
    Beta,
    Experimental,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Starter,
        Tier::Production,
        Tier::Stable,
        Tier::Beta,
        Tier::Experimental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Starter => "starter",
            Tier::Production => "production",
            Tier::Stable => "stable",
            Tier::Beta => "beta",
            Tier::Experimental => "experimental",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid tier '{0}': expected one of starter, production, stable, beta, experimental")]
pub struct InvalidTier(pub String);

impl FromStr for Tier {
    type Err = InvalidTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| InvalidTier(s.to_string()))
    }
}

/// A grouping label referenced by entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Source repository of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A file mirrored from the source repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMapping {
    pub path: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directories {
    #[serde(default, deserialize_with = "null_as_default")]
    pub docs: Vec<DocMapping>,
}

/// Link from one entry to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub template_id: String,
    #[serde(default)]
    pub relationship: String,
}

/// One registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub repo: Repo,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tier: Tier,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub directories: Directories,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relates_to: Vec<Relation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub docs_directory: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubApiSettings {
    #[serde(default)]
    pub concurrency: Option<usize>,
}

/// The optional `settings` mapping consumed by the aggregator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cache: CacheSettings,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: OutputSettings,
    #[serde(default, deserialize_with = "null_as_default")]
    pub github_api: GithubApiSettings,
}

/// Typed registry contents
///
/// Entries and categories are kept raw so one malformed item does not hide
/// the rest; [`RegistryView::entries`] and [`RegistryView::declared_categories`]
/// convert them individually. `version` is whatever scalar the file holds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegistryView {
    #[serde(default)]
    pub version: Value,
    #[serde(default, deserialize_with = "lenient")]
    pub categories: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub templates: Vec<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub settings: Settings,
}

impl RegistryView {
    /// Categories carrying an `id`; the rest are skipped
    pub fn declared_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter_map(|raw| serde_yaml::from_value(raw.clone()).ok())
            .collect()
    }

    /// Entries that deserialize cleanly; others are skipped with a warning
    pub fn entries(&self) -> Vec<Entry> {
        self.templates
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_yaml::from_value(raw.clone()) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(index, error = %err, "skipping malformed registry entry");
                    None
                }
            })
            .collect()
    }
}
