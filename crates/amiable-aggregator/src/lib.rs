//! # Amiable Aggregator
//!
//! Build-time mirroring of template documentation. For every registry
//! entry the head revision of its repository is resolved; unchanged
//! repositories are served from the cache manifest, others have their
//! `directories.docs` files fetched, rewritten to absolute URLs and written
//! under the output directory.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod manifest;
pub mod source;
pub mod transform;

use std::path::Path;

use amiable_registry::{Entry, RegistryError, RegistryView};

pub use aggregate::{AggregateSummary, Aggregator, EntryOutcome};
pub use config::AggregatorConfig;
pub use error::{AggregateError, Result};
pub use manifest::{CacheEntry, CacheManifest};
pub use source::{GitHubSource, RepositorySource};
pub use transform::ContentTransformer;

/// Read the registry through the symlink-safe document store
pub fn load_registry(path: &Path) -> Result<RegistryView> {
    let document = amiable_registry::store::load(path).map_err(RegistryError::from)?;
    Ok(document.view().map_err(RegistryError::from)?)
}

/// Aggregate `entries` and persist the updated cache manifest
pub async fn aggregate<S: RepositorySource>(
    config: &AggregatorConfig,
    source: S,
    entries: &[Entry],
) -> Result<AggregateSummary> {
    tokio::fs::create_dir_all(&config.output_dir).await?;

    let manifest_path = config.manifest_path();
    let aggregator = Aggregator::new(
        source,
        &config.output_dir,
        CacheManifest::load(&manifest_path),
    );
    let summary = aggregator.run(entries).await;
    aggregator.into_manifest().save(&manifest_path)?;
    Ok(summary)
}

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
