//! Aggregator configuration

use std::path::PathBuf;

use amiable_registry::Settings;
use amiable_registry::patterns::DEFAULT_TEMPLATES_FILE;
use tracing::warn;

use crate::error::{AggregateError, Result};

pub const DEFAULT_CACHE_DIR: &str = ".cache/templates";
pub const DEFAULT_OUTPUT_DIR: &str = "docs/templates";
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const MANIFEST_FILE: &str = "manifest.json";

/// Where to read the registry and where aggregated docs go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Registry file
    pub registry_path: PathBuf,

    /// Directory holding the cache manifest
    pub cache_dir: PathBuf,

    /// Root of the generated documentation tree
    pub output_dir: PathBuf,

    /// Maximum number of in-flight requests
    pub concurrency: usize,

    /// GitHub token; unauthenticated requests are heavily rate limited
    pub github_token: Option<String>,
}

impl AggregatorConfig {
    /// Registry location from `TEMPLATES_PATH`
    pub fn registry_path_from_env() -> PathBuf {
        std::env::var("TEMPLATES_PATH")
            .unwrap_or_else(|_| DEFAULT_TEMPLATES_FILE.to_string())
            .into()
    }

    /// Build from the registry's `settings` mapping
    pub fn from_settings(
        registry_path: impl Into<PathBuf>,
        settings: &Settings,
        github_token: Option<String>,
    ) -> Result<Self> {
        let concurrency = settings
            .github_api
            .concurrency
            .unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(AggregateError::Config(
                "settings.github_api.concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            registry_path: registry_path.into(),
            cache_dir: settings
                .cache
                .directory
                .as_deref()
                .unwrap_or(DEFAULT_CACHE_DIR)
                .into(),
            output_dir: settings
                .output
                .docs_directory
                .as_deref()
                .unwrap_or(DEFAULT_OUTPUT_DIR)
                .into(),
            concurrency,
            github_token: github_token.filter(|token| !token.is_empty()),
        })
    }

    /// Build from the registry's settings plus `GITHUB_TOKEN`
    pub fn from_env(registry_path: impl Into<PathBuf>, settings: &Settings) -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN").ok();
        let config = Self::from_settings(registry_path, settings, token)?;
        if config.github_token.is_none() {
            warn!("GITHUB_TOKEN not set; GitHub API rate limits will be low");
        }
        Ok(config)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.cache_dir.join(MANIFEST_FILE)
    }
}
