//! Error types for the template registry
//!
//! Errors are split by domain: [`DocumentError`] for reading, parsing and
//! editing the registry document, [`MutationError`] for pre-condition
//! failures of add/update/remove, and [`RegistryError`] for the fatal
//! conditions that propagate to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, editing or parsing a registry document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Refusing to follow symlink for security: {path}")]
    SymlinkRejected { path: PathBuf },

    #[error("YAML root must be a dictionary, got {found}")]
    NotADictionary { found: &'static str },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid UTF-8 content in file: {path}")]
    InvalidUtf8 { path: PathBuf },

    #[error("File read error: {path} - {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot edit document in place: {reason}")]
    Layout { reason: String },

    #[error("Edited document no longer matches the intended content")]
    EditMismatch,
}

impl DocumentError {
    pub(crate) fn layout<S: Into<String>>(reason: S) -> Self {
        DocumentError::Layout {
            reason: reason.into(),
        }
    }
}

/// Pre-condition failures of the entry mutation operations
///
/// The `Display` output of each variant is the message surfaced in
/// [`crate::WriteResult`].
#[derive(Error, Debug)]
pub enum MutationError {
    #[error(
        "Invalid template ID '{0}': must match pattern ^[a-z][a-z0-9-]*$ (lowercase letters, numbers, and hyphens, starting with a letter)"
    )]
    InvalidId(String),

    #[error(
        "Invalid repo owner '{0}': must be 1-39 alphanumeric characters or hyphens, cannot start or end with hyphen"
    )]
    InvalidOwner(String),

    #[error(
        "Invalid repo name '{0}': must be 1-100 alphanumeric characters, hyphens, underscores, or dots"
    )]
    InvalidRepoName(String),

    #[error("Failed to load YAML: {0}")]
    Load(#[source] DocumentError),

    #[error("Template with ID '{0}' already exists")]
    DuplicateId(String),

    #[error("Category '{0}' does not exist")]
    UnknownCategory(String),

    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Template '{id}' is referenced by: {}. Use --force to remove anyway.", .referrers.join(", "))]
    Referenced { id: String, referrers: Vec<String> },

    #[error("Failed to edit YAML: {0}")]
    Edit(#[source] DocumentError),
}

/// Fatal registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
