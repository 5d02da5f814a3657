//! template-manager: validate, list and edit the template registry
//!
//! Edits go through the format-preserving mutator, so comments and layout
//! in `templates.yaml` survive add/update/remove.

mod cli;
mod commands;
mod config;
mod error;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::ManagerConfig;

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("template_manager=info,amiable_registry=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match ManagerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };
    debug!(?config, "resolved configuration");

    let (mut out, mut err) = (io::stdout().lock(), io::stderr().lock());
    match commands::run(cli.command, &config, &mut out, &mut err) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
