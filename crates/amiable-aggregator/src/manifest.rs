//! Revision-keyed cache of fetched documentation
//!
//! The manifest remembers which commit each entry was last synced from, so
//! an unchanged repository is not fetched again.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry as MapEntry;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::Result;

/// Content digest in the `sha256:<hex>` form
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{:x}", hasher.finalize())
}

/// Sync record for a single entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub commit_sha: String,

    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,

    /// Target names written for this entry
    #[serde(default)]
    pub files: Vec<String>,

    /// Digest of each written target, keyed by target name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub digests: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheManifest {
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest, starting empty if it is missing or unreadable
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cache manifest yet");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read cache manifest");
                return Self::default();
            }
        };
        match serde_json::from_slice(&data) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to parse cache manifest");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_vec_pretty(self)?;
        json.push(b'\n');
        amiable_registry::store::write_atomic(path, &json)?;
        debug!(path = %path.display(), entries = self.entries.len(), "saved cache manifest");
        Ok(())
    }

    pub fn is_cached(&self, id: &str, revision: &str) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.commit_sha == revision)
    }

    /// Record a sync of `id` at `revision`, replacing any previous record
    pub fn update(&mut self, id: &str, revision: &str, files: Vec<String>) -> &mut CacheEntry {
        let record = CacheEntry {
            commit_sha: revision.to_string(),
            fetched_at: OffsetDateTime::now_utc(),
            files,
            digests: BTreeMap::new(),
        };
        match self.entries.entry(id.to_string()) {
            MapEntry::Vacant(slot) => slot.insert(record),
            MapEntry::Occupied(mut slot) => {
                slot.insert(record);
                slot.into_mut()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
