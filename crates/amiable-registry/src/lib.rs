//! # Amiable Registry
//!
//! The template registry: a YAML document listing external repositories
//! that serve as project templates, grouped into categories.
//!
//! - **Document store**: symlink-safe reads and atomic, permission-preserving writes
//! - **Schema validation**: Draft-07 shape checks with remote `$ref`s refused
//! - **Semantic validation**: unique IDs, category and `relates_to` references, link policy
//! - **Entry mutation**: add, update and remove entries without disturbing
//!   comments, ordering or quoting elsewhere in the file
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use amiable_registry::*;
//! use std::path::Path;
//!
//! # fn example() -> Result<()> {
//! let registry = Path::new("templates.yaml");
//! let entry = NewEntry::new(
//!     "fastapi-starter",
//!     "example-org",
//!     "fastapi-starter",
//!     "FastAPI Starter",
//!     "Minimal FastAPI service",
//!     "backend",
//! )
//! .with_tier(Tier::Beta);
//!
//! let result = add_entry(registry, &entry)?;
//! if !result.success {
//!     for error in &result.errors {
//!         eprintln!("Error: {error}");
//!     }
//! }
//!
//! let report = validate(registry, Path::new("templates.schema.yaml"));
//! println!("valid: {}", report.success);
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod error;
pub mod list;
pub mod model;
pub mod mutate;
pub mod patterns;
pub mod schema;
pub mod semantic;
pub mod store;
pub mod validate;

pub use document::{RegistryDocument, StyledDocument};
pub use error::{DocumentError, MutationError, RegistryError, Result};
pub use list::{EntrySummary, ListFilter, list_entries};
pub use model::{Category, DocMapping, Entry, InvalidTier, RegistryView, Repo, Settings, Tier};
pub use mutate::{EntryUpdate, NewEntry, WriteResult, add_entry, remove_entry, update_entry};
pub use schema::validate_schema;
pub use semantic::{SemanticReport, semantic_errors, validate_semantic};
pub use validate::{ValidationResult, validate};

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
