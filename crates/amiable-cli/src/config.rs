//! Default file locations

use std::path::{Path, PathBuf};

use amiable_registry::patterns::{DEFAULT_SCHEMA_FILE, DEFAULT_TEMPLATES_FILE};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Registry file used when `--templates` is not given
    pub templates_path: PathBuf,

    /// Schema file used when `--schema` is not given
    pub schema_path: PathBuf,
}

impl ManagerConfig {
    /// Load configuration from `TEMPLATES_PATH` and `TEMPLATES_SCHEMA_PATH`
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            templates_path: path_var("TEMPLATES_PATH", DEFAULT_TEMPLATES_FILE)?,
            schema_path: path_var("TEMPLATES_SCHEMA_PATH", DEFAULT_SCHEMA_FILE)?,
        })
    }

    pub fn templates<'a>(&'a self, flag: Option<&'a Path>) -> &'a Path {
        flag.unwrap_or(&self.templates_path)
    }

    pub fn schema<'a>(&'a self, flag: Option<&'a Path>) -> &'a Path {
        flag.unwrap_or(&self.schema_path)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            templates_path: DEFAULT_TEMPLATES_FILE.into(),
            schema_path: DEFAULT_SCHEMA_FILE.into(),
        }
    }
}

fn path_var(name: &str, default: &str) -> Result<PathBuf> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => {
            Err(CliError::Config(format!("{name} must not be empty")))
        }
        Ok(value) => Ok(value.into()),
        Err(_) => Ok(default.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.templates(None), Path::new("templates.yaml"));
        assert_eq!(
            config.templates(Some(Path::new("other.yaml"))),
            Path::new("other.yaml")
        );
        assert_eq!(config.schema(None), Path::new("templates.schema.yaml"));
    }
}
