//! estate-automl - Main Entry Point
//!
//! Preprocesses a property dataset and selects the best price regressor.

use clap::Parser;
use estate_automl::cli::{cmd_generate, cmd_run, Cli, Commands, RunArgs};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_automl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => {
            cmd_run(&args)?;
        }
        Some(Commands::Generate { output, samples, seed, missing_rate }) => {
            cmd_generate(&output, samples, seed, missing_rate)?;
        }
        None => {
            // Default: full run on synthetic data
            let args = RunArgs {
                samples: 1000,
                ..RunArgs::default()
            };
            cmd_run(&args)?;
        }
    }

    Ok(())
}
