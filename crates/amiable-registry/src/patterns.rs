//! Process-wide constants: identifier patterns and default locations.
//!
//! Everything here is initialized once and never mutated afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default registry document, relative to the working directory
pub const DEFAULT_TEMPLATES_FILE: &str = "templates.yaml";

/// Default schema document, relative to the working directory
pub const DEFAULT_SCHEMA_FILE: &str = "templates.schema.yaml";

/// Mode given to a freshly written document when the original mode is unknown
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Links starting with this prefix produce a policy warning
pub const INSECURE_SCHEME: &str = "http://";

/// Source file mirrored for every newly added entry
pub const DEFAULT_DOC_PATH: &str = "README.md";

/// Local name of the default mirrored file
pub const DEFAULT_DOC_TARGET: &str = "overview.md";

/// Entry IDs: lowercase letters, digits and hyphens, starting with a letter
pub static ENTRY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("entry id pattern"));

/// Repository owners: 1-39 alphanumerics or hyphens, no hyphen at either end
pub static REPO_OWNER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,37}[A-Za-z0-9])?$").expect("repo owner pattern")
});

/// Repository names: 1-100 alphanumerics, dots, underscores or hyphens
pub static REPO_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,100}$").expect("repo name pattern"));

/// URL of the repository page for `owner/name`
pub fn github_url(owner: &str, name: &str) -> String {
    format!("https://github.com/{}/{}", owner, name)
}
