//! Markdown rewriting for mirrored documentation
//!
//! Relative references in a fetched file point into the source repository,
//! so they are rewritten to absolute URLs pinned at the synced revision.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("static image regex"));

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("static link regex"));

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Collapse `.` and `..` segments; `..` never climbs above the root
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Rewrites one file fetched from `owner/repo` at `revision`
#[derive(Debug, Clone)]
pub struct ContentTransformer {
    owner: String,
    repo: String,
    revision: String,
    base_dir: String,
}

impl ContentTransformer {
    pub fn new(owner: &str, repo: &str, revision: &str, source_path: &str) -> Self {
        let base_dir = source_path
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default();
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            revision: revision.to_string(),
            base_dir,
        }
    }

    /// Repository-relative path of `target` as seen from the source file
    pub fn resolve(&self, target: &str) -> String {
        let target = target.strip_prefix("./").unwrap_or(target);
        if self.base_dir.is_empty() {
            normalize_path(target)
        } else {
            normalize_path(&format!("{}/{}", self.base_dir, target))
        }
    }

    fn raw_url(&self, path: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.owner,
            self.repo,
            self.revision,
            self.resolve(path)
        )
    }

    fn blob_url(&self, path: &str) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            self.owner,
            self.repo,
            self.revision,
            self.resolve(path)
        )
    }

    pub fn short_revision(&self) -> String {
        self.revision.chars().take(7).collect()
    }

    fn attribution(&self, date: Date) -> String {
        let synced = date
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();
        format!(
            "!!! info \"Source Repository\"\n    \
             This documentation is from [{owner}/{repo}](https://github.com/{owner}/{repo}).\n    \
             Last synced: {synced} | Commit: `{short}`\n\n",
            owner = self.owner,
            repo = self.repo,
            short = self.short_revision(),
        )
    }

    /// Rewrite `content`, stamping today's date
    pub fn transform(&self, content: &str) -> String {
        self.transform_at(content, OffsetDateTime::now_utc().date())
    }

    pub fn transform_at(&self, content: &str, date: Date) -> String {
        let with_images = IMAGE.replace_all(content, |caps: &Captures| {
            let (alt, path) = (&caps[1], &caps[2]);
            if is_absolute(path) {
                caps[0].to_string()
            } else {
                format!("![{alt}]({})", self.raw_url(path))
            }
        });

        let with_links = LINK.replace_all(&with_images, |caps: &Captures| {
            let (text, url) = (&caps[1], &caps[2]);
            if is_absolute(url) || url.starts_with('#') || url.starts_with("mailto:") {
                return caps[0].to_string();
            }
            if url.ends_with(".md") {
                format!("[{text}]({})", self.blob_url(url))
            } else {
                caps[0].to_string()
            }
        });

        format!("{}{}", self.attribution(date), with_links)
    }
}
