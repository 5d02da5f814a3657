//! Aggregation driver

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use amiable_registry::Entry;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{AggregateError, Result};
use crate::manifest::{CacheManifest, content_digest};
use crate::source::RepositorySource;
use crate::transform::ContentTransformer;

/// Check that `path` stays inside the directory it is joined to
pub fn safe_relative(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let mut normal = 0;
    for component in candidate.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => return Err(AggregateError::UnsafeTarget(path.to_string())),
        }
    }
    if normal == 0 {
        return Err(AggregateError::UnsafeTarget(path.to_string()));
    }
    Ok(candidate.to_path_buf())
}

/// What happened to a single entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Fetched at a new revision; the targets written
    Fetched { files: Vec<String> },
    /// Manifest already at the head revision
    Cached,
    /// Head revision could not be resolved
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub cached: usize,
}

/// Mirrors each entry's documentation into `output_dir/<entry id>/`
pub struct Aggregator<S> {
    source: S,
    output_dir: PathBuf,
    manifest: Mutex<CacheManifest>,
}

impl<S: RepositorySource> Aggregator<S> {
    pub fn new(source: S, output_dir: impl Into<PathBuf>, manifest: CacheManifest) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
            manifest: Mutex::new(manifest),
        }
    }

    /// Process all entries concurrently; failures are logged per entry
    pub async fn run(&self, entries: &[Entry]) -> AggregateSummary {
        let outcomes = join_all(
            entries
                .iter()
                .map(|entry| async move { (entry, self.aggregate_entry(entry).await) }),
        )
        .await;

        let mut summary = AggregateSummary {
            processed: entries.len(),
            ..AggregateSummary::default()
        };
        for (entry, outcome) in outcomes {
            match outcome {
                Ok(EntryOutcome::Fetched { .. }) => summary.succeeded += 1,
                Ok(EntryOutcome::Cached) => {
                    summary.succeeded += 1;
                    summary.cached += 1;
                }
                Ok(EntryOutcome::Skipped) => {}
                Err(err) => error!(id = %entry.id, error = %err, "failed to aggregate entry"),
            }
        }

        info!(
            "Aggregation complete: {}/{} templates processed successfully ({} cached)",
            summary.succeeded, summary.processed, summary.cached
        );
        summary
    }

    pub async fn aggregate_entry(&self, entry: &Entry) -> Result<EntryOutcome> {
        let entry_dir = self.output_dir.join(safe_relative(&entry.id)?);
        let (owner, repo) = (entry.repo.owner.as_str(), entry.repo.name.as_str());

        let Some(revision) = self.source.head_revision(owner, repo).await else {
            warn!(id = %entry.id, repo = %entry.repo, "could not resolve head revision, skipping");
            return Ok(EntryOutcome::Skipped);
        };

        if self.manifest.lock().await.is_cached(&entry.id, &revision) {
            info!(id = %entry.id, revision = %revision, "unchanged, using cache");
            return Ok(EntryOutcome::Cached);
        }

        tokio::fs::create_dir_all(&entry_dir).await?;

        let mut files = Vec::new();
        let mut digests = BTreeMap::new();
        for doc in &entry.directories.docs {
            let target = match safe_relative(&doc.target) {
                Ok(target) => target,
                Err(err) => {
                    warn!(id = %entry.id, error = %err, "skipping doc mapping");
                    continue;
                }
            };
            let Some(content) = self
                .source
                .fetch_file(owner, repo, &revision, &doc.path)
                .await
            else {
                warn!(id = %entry.id, path = %doc.path, "failed to fetch doc");
                continue;
            };

            let rendered =
                ContentTransformer::new(owner, repo, &revision, &doc.path).transform(&content);
            let output = entry_dir.join(&target);
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&output, rendered.as_bytes()).await?;
            debug!(path = %output.display(), "wrote doc");

            digests.insert(doc.target.clone(), content_digest(rendered.as_bytes()));
            files.push(doc.target.clone());
        }

        self.manifest
            .lock()
            .await
            .update(&entry.id, &revision, files.clone())
            .digests = digests;
        info!(id = %entry.id, files = files.len(), "synced documentation");

        Ok(EntryOutcome::Fetched { files })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_manifest(self) -> CacheManifest {
        self.manifest.into_inner()
    }
}
