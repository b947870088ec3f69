//! Madrid Rental Price - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use clap::{Parser, Subcommand};
use inference_engine::PricePredictor;
use std::path::{Path, PathBuf};
use tracing::info;

/// Madrid rental price prediction service
#[derive(Parser, Debug)]
#[command(name = "rental-price")]
#[command(version)]
#[command(about = "Serve and evaluate Madrid rental price predictions", long_about = None)]
struct Args {
    /// Configuration file, extension optional
    #[arg(short, long, default_value = api::config::DEFAULT_CONFIG_FILE)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Score the configured model against labelled samples
    Evaluate {
        /// CSV of property features with a `price` column
        #[arg(short, long)]
        samples: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(&args.config).context("failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("=== Madrid Rental Price v{} ===", env!("CARGO_PKG_VERSION"));

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Evaluate { samples } => evaluate(&config, &samples),
    }
}

fn evaluate(config: &AppConfig, samples: &Path) -> anyhow::Result<()> {
    let predictor = PricePredictor::load(&config.artifacts).context("failed to load artifacts")?;
    let samples = storage::load_labelled_samples(samples)?;

    let evaluation = predictor.evaluate(&samples)?;
    info!(
        "Evaluated {} samples, skipped {}",
        evaluation.evaluated, evaluation.skipped
    );

    match evaluation.metrics {
        Some(metrics) => println!("{}", metrics),
        None => println!("No samples could be evaluated"),
    }
    Ok(())
}
