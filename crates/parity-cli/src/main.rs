//! API parity runner
//!
//! Loads a run config, expands the case catalogue, and compares every case
//! against both targets.
//!
//! ```bash
//! api-parity [CONFIG]        # CONFIG defaults to $PARITY_CONFIG, then parity.yaml
//! api-parity -v              # per-request logging (same as RUST_LOG=debug)
//! ```

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use parity_compare::{
    ComparisonRunner, ConsoleReporter, DirectoryReporter, FanoutReporter, Reporter, RunConfig,
};
use parity_config::Workbook;
use parity_core::{EndpointDefinition, RequestPlan};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_log_level())),
        )
        .with_target(true)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every case passed
async fn run(cli: &Cli) -> Result<bool> {
    info!("Loading run config from {}", cli.config.display());

    let config = RunConfig::load(&cli.config)
        .with_context(|| format!("failed to load run config {}", cli.config.display()))?;
    let plans = load_plans(&config)?;
    if plans.is_empty() {
        warn!("Catalogue produced no cases");
    }

    let runner = ComparisonRunner::from_config(&config)?;
    let mut reporter = reporter(&config)?;

    info!(
        "Comparing {} cases: {} vs {}",
        plans.len(),
        config.primary_url,
        config.secondary_url
    );
    let summary = runner.run_all(&plans, reporter.as_mut()).await;

    Ok(summary.all_passed())
}

fn load_plans(config: &RunConfig) -> Result<Vec<RequestPlan>> {
    let workbook = Workbook::load(&config.catalogue)
        .with_context(|| format!("failed to load catalogue {}", config.catalogue.display()))?;

    let accounts = config
        .accounts
        .resolve(workbook.rows(&config.account_sheet)?)?;
    let endpoints = EndpointDefinition::from_rows(workbook.rows(&config.endpoint_sheet)?);
    info!(
        "Loaded {} endpoints and {} accounts from {}",
        endpoints.len(),
        accounts.len(),
        workbook.path().display()
    );

    Ok(config.expander()?.expand(&endpoints, &accounts).plans)
}

fn reporter(config: &RunConfig) -> Result<Box<dyn Reporter>> {
    match &config.report_dir {
        Some(dir) => {
            let directory = DirectoryReporter::create(dir.clone())
                .with_context(|| format!("failed to prepare report directory {}", dir.display()))?;
            Ok(Box::new(
                FanoutReporter::new()
                    .with(ConsoleReporter::new())
                    .with(directory),
            ))
        }
        None => Ok(Box::new(ConsoleReporter::new())),
    }
}
