//! Simmer CLI Binary
//!
//! Command-line interface for the Simmer recipe generation scheduler.

use anyhow::Context;
use clap::Parser;
use simmer::cli::{Cli, RunContext};
use simmer::config::{ConfigLoader, SimmerConfig};
use simmer::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let config = load_config(&cli).context("failed to load configuration")?;

    // Initialize logging before anything else logs
    let logging_config = build_logging_config(&cli, &config);
    init_logging(Some(&logging_config)).context("failed to initialize logging")?;
    info!("Simmer CLI starting");

    let context = RunContext::new(cli.workspace.clone(), config)
        .context("failed to initialize run context")?;
    let result = context.execute(&cli.command).await;
    context.shutdown().await;

    let output = result?;
    info!("Command completed successfully");
    Ok(output)
}

fn load_config(cli: &Cli) -> Result<SimmerConfig, simmer::ApiError> {
    match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.workspace),
    }
}

/// Build logging configuration from CLI args over the loaded config.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: &SimmerConfig) -> LoggingConfig {
    let mut logging = config.logging.clone();

    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        logging.file = file.clone();
    } else if logging.file.is_relative() {
        logging.file = cli.workspace.join(&logging.file);
    }

    logging
}
