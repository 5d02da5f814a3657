//! Command-line surface

use std::path::PathBuf;

use amiable_registry::Tier;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "template-manager", version)]
#[command(about = "Manage templates.yaml registry entries with schema validation")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate templates.yaml against the schema and registry rules
    Validate {
        #[command(flatten)]
        templates: TemplatesArg,

        /// Path to the schema file (default: templates.schema.yaml)
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// List templates in the registry
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Filter by tier (starter, production, stable, beta, experimental)
        #[arg(long)]
        tier: Option<String>,

        #[command(flatten)]
        templates: TemplatesArg,
    },

    /// Add a new template to the registry
    Add(AddArgs),

    /// Update an existing template
    Update(UpdateArgs),

    /// Remove a template from the registry
    Remove {
        /// Template ID to remove
        id: String,

        /// Remove even if other templates reference it
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        templates: TemplatesArg,
    },
}

#[derive(Debug, Clone, Args)]
pub struct TemplatesArg {
    /// Path to templates.yaml (default: templates.yaml, or TEMPLATES_PATH)
    #[arg(long = "templates")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Unique template identifier (lowercase, hyphens allowed)
    #[arg(long)]
    pub id: String,

    /// GitHub repository (format: owner/name)
    #[arg(long)]
    pub repo: String,

    /// Display title
    #[arg(long)]
    pub title: String,

    /// Brief description
    #[arg(long)]
    pub description: String,

    /// Category ID reference
    #[arg(long)]
    pub category: String,

    /// Template tier
    #[arg(long, default_value = "starter")]
    pub tier: Tier,

    /// Comma-separated list of tags
    #[arg(long)]
    pub tags: Option<String>,

    /// Comma-separated list of features
    #[arg(long)]
    pub features: Option<String>,

    #[command(flatten)]
    pub templates: TemplatesArg,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Template ID to update
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub tier: Option<Tier>,

    /// Comma-separated list of new tags
    #[arg(long)]
    pub tags: Option<String>,

    /// Comma-separated list of new features
    #[arg(long)]
    pub features: Option<String>,

    #[command(flatten)]
    pub templates: TemplatesArg,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "template-manager",
            "add",
            "--id",
            "new-one",
            "--repo",
            "acme/api",
            "--title",
            "New",
            "--description",
            "Desc",
            "--category",
            "backend",
            "--tags",
            "a, b",
        ])
        .unwrap();
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.tier, Tier::Starter);
        assert_eq!(args.tags.as_deref(), Some("a, b"));
        assert!(args.templates.path.is_none());
    }

    #[test]
    fn test_parse_update_tier() {
        let cli = Cli::try_parse_from([
            "template-manager",
            "update",
            "some-id",
            "--tier",
            "beta",
            "--templates",
            "custom.yaml",
        ])
        .unwrap();
        let Command::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.id, "some-id");
        assert_eq!(args.tier, Some(Tier::Beta));
        assert_eq!(args.templates.path, Some(PathBuf::from("custom.yaml")));
    }

    #[test]
    fn test_invalid_tier_rejected() {
        let err = Cli::try_parse_from(["template-manager", "update", "x", "--tier", "gold"])
            .unwrap_err();
        assert!(err.to_string().contains("gold"));
    }

    #[test]
    fn test_add_requires_fields() {
        assert!(Cli::try_parse_from(["template-manager", "add", "--id", "x"]).is_err());
    }

    #[test]
    fn test_list_defaults_to_text() {
        let cli = Cli::try_parse_from(["template-manager", "list", "--category", "web"]).unwrap();
        let Command::List {
            format, category, ..
        } = cli.command
        else {
            panic!("expected list");
        };
        assert_eq!(format, OutputFormat::Text);
        assert_eq!(category.as_deref(), Some("web"));
    }

    #[test]
    fn test_remove_force_flag() {
        let cli = Cli::try_parse_from(["template-manager", "remove", "old", "--force"]).unwrap();
        assert!(matches!(cli.command, Command::Remove { force: true, .. }));
    }
}
