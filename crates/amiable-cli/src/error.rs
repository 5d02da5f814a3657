//! Error types for the command-line manager

use std::path::PathBuf;

use amiable_registry::{DocumentError, RegistryError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Templates file not found: {}", .0.display())]
    TemplatesNotFound(PathBuf),

    #[error("Schema file not found: {}", .0.display())]
    SchemaNotFound(PathBuf),

    #[error("Invalid repo format '{0}'. Expected 'owner/name'")]
    InvalidRepo(String),

    #[error("Failed to load templates: {0}")]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
