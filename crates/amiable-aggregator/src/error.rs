//! Error types for the aggregation pipeline

use amiable_registry::RegistryError;
use thiserror::Error;

/// Result type for aggregation operations
pub type Result<T> = std::result::Result<T, AggregateError>;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Refusing unsafe output path '{0}': must be relative without '..'")]
    UnsafeTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
