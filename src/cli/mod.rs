//! estate-automl CLI Module
//!
//! Command-line interface for generating data and running preprocessing plus
//! model selection end to end.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::AutoMlConfig;
use crate::preprocessing::FeaturePreprocessor;
use crate::synthetic::HousingDataGenerator;
use crate::training::{CandidateOutcome, ModelSelector};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "estate-automl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Preprocess property data and select the best price regressor")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Preprocess a dataset, train every candidate and report the best
    Run(RunArgs),

    /// Write the synthetic housing dataset to CSV
    Generate {
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of rows
        #[arg(short = 'n', long, default_value = "1000")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Fraction of feature cells to blank out
        #[arg(long, default_value = "0.0")]
        missing_rate: f64,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Input CSV file (synthetic data is generated when omitted)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Target column name
    #[arg(short, long)]
    pub target: Option<String>,

    /// Rows of synthetic data to generate
    #[arg(short = 'n', long, default_value = "1000")]
    pub samples: usize,

    /// Seed for data generation and the train / held-out split
    #[arg(long)]
    pub seed: Option<u64>,

    /// Comma-separated candidate names to keep
    #[arg(short, long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Train candidates in parallel
    #[arg(long)]
    pub parallel: bool,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(args: &RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => AutoMlConfig::from_json_file(path)?,
        None => AutoMlConfig::default(),
    };
    if let Some(target) = &args.target {
        config.target_column = target.clone();
    }
    if let Some(seed) = args.seed {
        config.selection.random_state = seed;
    }
    config.selection.parallel |= args.parallel;
    config.validate()?;

    section("Data");
    step_run("Loading data");
    let start = Instant::now();
    let df = match &args.data {
        Some(path) => DataLoader::new().load_csv(path)?,
        None => HousingDataGenerator::new(args.samples)
            .with_seed(args.seed.unwrap_or(42))
            .generate()?,
    };
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    println!();
    println!("{}", df.head(Some(5)));

    section("Preprocess");
    step_run("Fitting preprocessor");
    let start = Instant::now();
    let mut preprocessor = FeaturePreprocessor::with_config(config.preprocessing.clone());
    let (x, y) = preprocessor.fit_transform(&df, &config.target_column)?;
    step_done(&format!("{} rows × {} features in {:?}", x.nrows(), x.ncols(), start.elapsed()));

    println!(
        "  {:<16} {}",
        muted("Numeric"),
        preprocessor.numeric_columns().join(", ").white()
    );
    println!(
        "  {:<16} {}",
        muted("Categorical"),
        preprocessor.categorical_columns().join(", ").white()
    );

    section("Model Selection");
    let mut selector = ModelSelector::new(config.selection.clone());
    if !args.models.is_empty() {
        let names: Vec<&str> = args.models.iter().map(|m| m.trim()).collect();
        selector.restrict_to(&names)?;
    }

    step_run(&format!("Training {} candidates", selector.candidate_names().len()));
    let start = Instant::now();
    let selection = selector.train_and_evaluate(&x, &y)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!(
        "  {:<22} {:>16} {:>10} {:>10}",
        muted("Model"),
        muted("MSE"),
        muted("R²"),
        muted("Time")
    );
    for (name, outcome) in selection.results() {
        match outcome {
            CandidateOutcome::Scored { metrics, training_time_secs } => {
                let line = format!(
                    "{:<22} {:>16.2} {:>10.4} {:>9.3}s",
                    name, metrics.mse, metrics.r2, training_time_secs
                );
                if name == selection.best_name() {
                    println!("  {}", line.white().bold());
                } else {
                    println!("  {}", line.white());
                }
            }
            CandidateOutcome::Failed(err) => {
                println!("  {:<22} {}", name, format!("failed: {}", err.source).red());
            }
        }
    }

    println!();
    println!(
        "  {} {} {}",
        ok("✓"),
        "Best model:".white(),
        accent(selection.best_name()).bold()
    );
    println!("  {:<16} {}", muted("R²"), format!("{:.4}", selection.best_score()).white().bold());
    println!();

    Ok(())
}

pub fn cmd_generate(output: &PathBuf, samples: usize, seed: u64, missing_rate: f64) -> anyhow::Result<()> {
    section("Generate");

    step_run("Generating housing data");
    let mut df = HousingDataGenerator::new(samples)
        .with_seed(seed)
        .with_missing_rate(missing_rate)
        .generate()?;
    step_done(&format!("{} rows", df.height()));

    step_run(&format!("Saving → {}", output.display()));
    DataSaver::save_csv(&mut df, output)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    println!();
    Ok(())
}
