//! Mirror template documentation into the docs tree

use std::process::ExitCode;

use amiable_aggregator::{AggregatorConfig, GitHubSource, Result, aggregate, load_registry};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Partial failures are logged; only configuration and I/O errors are fatal
async fn run() -> Result<()> {
    let registry_path = AggregatorConfig::registry_path_from_env();
    let view = load_registry(&registry_path)?;
    let config = AggregatorConfig::from_env(&registry_path, &view.settings)?;
    info!(
        "Aggregating {} into {} (concurrency {})",
        registry_path.display(),
        config.output_dir.display(),
        config.concurrency
    );

    let source = GitHubSource::new(config.github_token.clone(), config.concurrency)?;
    let entries = view.entries();
    aggregate(&config, source, &entries).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("amiable_aggregator=info,amiable_registry=info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Aggregation failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
