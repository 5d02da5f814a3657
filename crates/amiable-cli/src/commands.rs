//! Subcommand handlers
//!
//! Handlers write user-facing output to the given streams and return
//! whether the command succeeded.

use std::io::Write;
use std::path::Path;

use amiable_registry::{
    EntrySummary, EntryUpdate, ListFilter, NewEntry, WriteResult, add_entry, list_entries,
    remove_entry, update_entry, validate,
};

use crate::cli::{AddArgs, Command, OutputFormat, UpdateArgs};
use crate::config::ManagerConfig;
use crate::error::{CliError, Result};

/// Split a comma-separated flag, trimming each item; empty input means unset
pub fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    raw.filter(|value| !value.is_empty())
        .map(|value| value.split(',').map(|item| item.trim().to_string()).collect())
}

/// Split `owner/name`
pub fn parse_repo(repo: &str) -> Result<(&str, &str)> {
    let mut parts = repo.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => Ok((owner, name)),
        _ => Err(CliError::InvalidRepo(repo.to_string())),
    }
}

fn existing(path: &Path) -> Result<&Path> {
    if path.exists() || path.is_symlink() {
        Ok(path)
    } else {
        Err(CliError::TemplatesNotFound(path.to_path_buf()))
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

pub fn run(
    command: Command,
    config: &ManagerConfig,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    match command {
        Command::Validate { templates, schema } => {
            let templates = config.templates(templates.path.as_deref());
            let schema = config.schema(schema.as_deref());
            run_validate(templates, schema, out, err)
        }
        Command::List {
            format,
            category,
            tier,
            templates,
        } => {
            let filter = ListFilter { category, tier };
            run_list(config.templates(templates.path.as_deref()), &filter, format, out)
        }
        Command::Add(args) => run_add(&args, config, out, err),
        Command::Update(args) => run_update(&args, config, out, err),
        Command::Remove {
            id,
            force,
            templates,
        } => {
            let path = existing(config.templates(templates.path.as_deref()))?;
            let result = remove_entry(path, &id, force)?;
            report(&result, format!("Removed template '{id}'"), out, err)
        }
    }
}

pub fn run_validate(
    templates: &Path,
    schema: &Path,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    existing(templates)?;
    if !schema.exists() {
        return Err(CliError::SchemaNotFound(schema.to_path_buf()));
    }

    let result = validate(templates, schema);
    for (label, items) in [
        ("Schema validation errors:", &result.schema_errors),
        ("Semantic validation errors:", &result.semantic_errors),
        ("Warnings:", &result.warnings),
    ] {
        if !items.is_empty() {
            writeln!(err, "{label}")?;
            for item in items {
                writeln!(err, "  - {item}")?;
            }
        }
    }

    if result.success {
        writeln!(out, "Validation passed: {}", templates.display())?;
    } else {
        writeln!(err, "Validation failed: {}", templates.display())?;
    }
    Ok(result.success)
}

pub fn run_list(
    templates: &Path,
    filter: &ListFilter,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<bool> {
    let entries = list_entries(existing(templates)?, filter)?;
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
        }
        OutputFormat::Text => write_table(&entries, out)?,
    }
    Ok(true)
}

fn write_table(entries: &[EntrySummary], out: &mut impl Write) -> Result<()> {
    if entries.is_empty() {
        writeln!(out, "No templates found matching criteria.")?;
        return Ok(());
    }

    writeln!(out, "{:<30} {:<35} {:<20} {:<12}", "ID", "Title", "Category", "Tier")?;
    writeln!(out, "{}", "-".repeat(97))?;
    for entry in entries {
        let id = entry.id.as_deref().filter(|s| !s.is_empty()).unwrap_or("unknown");
        let title = entry.title.as_deref().filter(|s| !s.is_empty()).unwrap_or("Untitled");
        let category = entry.category.as_deref().filter(|s| !s.is_empty()).unwrap_or("none");
        let tier = entry.tier.as_deref().filter(|s| !s.is_empty()).unwrap_or("none");
        writeln!(
            out,
            "{:<30} {:<35} {:<20} {:<12}",
            truncate(id, 30),
            truncate(title, 35),
            truncate(category, 20),
            truncate(tier, 12)
        )?;
    }
    writeln!(out, "\nTotal: {} template(s)", entries.len())?;
    Ok(())
}

fn run_add(
    args: &AddArgs,
    config: &ManagerConfig,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    let path = existing(config.templates(args.templates.path.as_deref()))?;
    let (owner, name) = parse_repo(&args.repo)?;

    let mut entry = NewEntry::new(
        &args.id,
        owner,
        name,
        &args.title,
        &args.description,
        &args.category,
    )
    .with_tier(args.tier);
    if let Some(tags) = split_list(args.tags.as_deref()) {
        entry = entry.with_tags(tags);
    }
    if let Some(features) = split_list(args.features.as_deref()) {
        entry = entry.with_features(features);
    }

    let result = add_entry(path, &entry)?;
    let message = format!("Added template '{}' to {}", args.id, path.display());
    report(&result, message, out, err)
}

fn run_update(
    args: &UpdateArgs,
    config: &ManagerConfig,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    let path = existing(config.templates(args.templates.path.as_deref()))?;
    let update = EntryUpdate {
        title: args.title.clone(),
        description: args.description.clone(),
        category: args.category.clone(),
        tier: args.tier,
        tags: split_list(args.tags.as_deref()),
        features: split_list(args.features.as_deref()),
    };

    let result = update_entry(path, &args.id, &update)?;
    report(&result, format!("Updated template '{}'", args.id), out, err)
}

fn report(
    result: &WriteResult,
    success_message: String,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    for error in &result.errors {
        writeln!(err, "Error: {error}")?;
    }
    for warning in &result.warnings {
        writeln!(err, "Warning: {warning}")?;
    }
    if result.success {
        writeln!(out, "{success_message}")?;
    }
    Ok(result.success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, TemplatesArg};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const REGISTRY: &str = r#"# Registry
version: "1.0"
categories:
  - id: backend
    name: Backend
templates:
  - id: api-starter
    repo:
      owner: acme
      name: api
    title: API Starter
    description: Service template
    category: backend
    tier: beta
    tags: [python]
    directories:
      docs:
        - path: README.md
          target: overview.md
"#;

    fn setup() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("templates.yaml");
        fs::write(&path, REGISTRY).unwrap();
        (dir, path)
    }

    fn config_for(path: &Path) -> ManagerConfig {
        ManagerConfig {
            templates_path: path.to_path_buf(),
            schema_path: Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates.schema.yaml"),
        }
    }

    fn execute(args: &[&str], config: &ManagerConfig) -> (Result<bool>, String, String) {
        let cli = Cli::try_parse_from(args).unwrap();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let result = run(cli.command, config, &mut out, &mut err);
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(Some("a, b ,c")),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(split_list(Some("")), None);
        assert_eq!(split_list(None), None);
    }

    #[test]
    fn test_parse_repo() {
        assert_eq!(parse_repo("acme/api").unwrap(), ("acme", "api"));
        for bad in ["acme", "a/b/c"] {
            assert!(matches!(parse_repo(bad), Err(CliError::InvalidRepo(_))));
        }
    }

    #[test]
    fn test_text_table() {
        let (_dir, path) = setup();
        let (result, out, _) = execute(&["template-manager", "list"], &config_for(&path));
        assert!(result.unwrap());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            format!("{:<30} {:<35} {:<20} {:<12}", "ID", "Title", "Category", "Tier")
        );
        assert_eq!(lines[1], "-".repeat(97));
        assert!(lines[2].starts_with("api-starter "));
        assert_eq!(&lines[2][31..42], "API Starter");
        assert_eq!(lines[4], "Total: 1 template(s)");
    }

    #[test]
    fn test_table_defaults_and_truncation() {
        let mut out = Vec::new();
        let long = "x".repeat(50);
        let entries = vec![EntrySummary {
            id: None,
            title: Some(long),
            description: None,
            category: None,
            tier: None,
            tags: Vec::new(),
            features: Vec::new(),
        }];
        write_table(&entries, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text.lines().nth(2).unwrap();
        assert!(row.starts_with("unknown"));
        assert!(row.contains(&format!("{} none", "x".repeat(35))));
    }

    #[test]
    fn test_empty_listing_message() {
        let (_dir, path) = setup();
        let (_, out, _) = execute(
            &["template-manager", "list", "--category", "frontend"],
            &config_for(&path),
        );
        assert_eq!(out, "No templates found matching criteria.\n");
    }

    #[test]
    fn test_json_listing() {
        let (_dir, path) = setup();
        let (_, out, _) = execute(
            &["template-manager", "list", "--format", "json", "--tier", "beta"],
            &config_for(&path),
        );
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json[0]["id"], "api-starter");
        assert_eq!(json[0]["tags"][0], "python");
        assert_eq!(json[0]["features"], serde_json::json!([]));
    }

    #[test]
    fn test_validate_reports_and_passes() {
        let (_dir, path) = setup();
        let (result, out, err) = execute(&["template-manager", "validate"], &config_for(&path));
        assert!(result.unwrap(), "{err}");
        assert_eq!(out, format!("Validation passed: {}\n", path.display()));
    }

    #[test]
    fn test_validate_failure_goes_to_stderr() {
        let (_dir, path) = setup();
        fs::write(&path, REGISTRY.replace("category: backend", "category: nowhere")).unwrap();
        let (result, out, err) = execute(&["template-manager", "validate"], &config_for(&path));
        assert!(!result.unwrap());
        assert!(out.is_empty());
        assert!(err.contains("Semantic validation errors:\n  - Template 'api-starter'"));
        assert!(err.ends_with(&format!("Validation failed: {}\n", path.display())));
    }

    #[test]
    fn test_missing_schema() {
        let (dir, path) = setup();
        let mut config = config_for(&path);
        config.schema_path = dir.path().join("absent.yaml");
        let (result, _, _) = execute(&["template-manager", "validate"], &config);
        assert!(matches!(result, Err(CliError::SchemaNotFound(_))));
    }

    #[test]
    fn test_missing_templates_file() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("none.yaml"));
        let (result, _, _) = execute(&["template-manager", "remove", "x"], &config);
        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Templates file not found:"));
    }

    #[test]
    fn test_add_update_remove() {
        let (_dir, path) = setup();
        let config = config_for(&path);

        let (result, out, err) = execute(
            &[
                "template-manager",
                "add",
                "--id",
                "web-app",
                "--repo",
                "acme/web",
                "--title",
                "Web App",
                "--description",
                "Frontend",
                "--category",
                "backend",
                "--tags",
                "react, vite",
            ],
            &config,
        );
        assert!(result.unwrap(), "{err}");
        assert_eq!(
            out,
            format!("Added template 'web-app' to {}\n", path.display())
        );

        let (result, out, _) = execute(
            &["template-manager", "update", "web-app", "--title", "Web Shell"],
            &config,
        );
        assert!(result.unwrap());
        assert_eq!(out, "Updated template 'web-app'\n");
        assert!(fs::read_to_string(&path).unwrap().contains("title: Web Shell"));

        let (result, out, _) = execute(&["template-manager", "remove", "web-app"], &config);
        assert!(result.unwrap());
        assert_eq!(out, "Removed template 'web-app'\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), REGISTRY);
    }

    #[test]
    fn test_add_rejects_bad_repo_before_loading() {
        let (_dir, path) = setup();
        let (result, _, _) = execute(
            &[
                "template-manager",
                "add",
                "--id",
                "x",
                "--repo",
                "no-slash",
                "--title",
                "T",
                "--description",
                "D",
                "--category",
                "backend",
            ],
            &config_for(&path),
        );
        assert!(matches!(result, Err(CliError::InvalidRepo(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), REGISTRY);
    }

    #[test]
    fn test_mutation_errors_are_printed() {
        let (_dir, path) = setup();
        let (result, out, err) = execute(
            &["template-manager", "update", "ghost", "--title", "T"],
            &config_for(&path),
        );
        assert!(!result.unwrap());
        assert!(out.is_empty());
        assert_eq!(err, "Error: Template 'ghost' not found\n");
    }

    #[test]
    fn test_templates_flag_overrides_config() {
        let (_dir, path) = setup();
        let config = ManagerConfig::default();
        let args = TemplatesArg {
            path: Some(path.clone()),
        };
        assert_eq!(config.templates(args.path.as_deref()), path.as_path());
    }
}
