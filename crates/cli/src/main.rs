//! Learning Style Detection CLI
//!
//! Trains and inspects models offline, and talks to a running prediction
//! service for single predictions, stored prediction lookups, and health.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{health, inspect, predict, predictions, train};
use std::path::PathBuf;
use style_lib::training::TrainingConfig;
use tracing_subscriber::EnvFilter;

/// Learning Style Detection CLI
#[derive(Parser)]
#[command(name = "lsd")]
#[command(author, version, about = "CLI for Learning Style Detection", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via LSD_API_URL env var)
    #[arg(long, env = "LSD_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the classifier and write model artifacts
    Train {
        /// Labeled CSV dataset
        data: PathBuf,

        /// Directory for model.json, preprocessor.json, and the report
        #[arg(long, short, default_value = ".")]
        out_dir: PathBuf,

        /// Number of independently seeded forests
        #[arg(long, default_value_t = 3)]
        runs: usize,

        /// Trees per forest
        #[arg(long, default_value_t = 100)]
        n_estimators: usize,

        /// Maximum tree depth (unlimited if not set)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Fraction of each class held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        /// Seed for the train/test split
        #[arg(long, default_value_t = 42)]
        split_seed: u64,

        /// Run N trains with seed BASE_SEED + N
        #[arg(long, default_value_t = 42)]
        base_seed: u64,
    },

    /// Validate a dataset and summarize it
    Inspect {
        /// Labeled CSV dataset
        data: PathBuf,
    },

    /// Predict the learning style of one student record
    Predict(predict::RecordArgs),

    /// Query stored predictions
    #[command(subcommand)]
    Predictions(PredictionsCommands),

    /// Show service health and readiness
    Health,
}

#[derive(Subcommand)]
pub enum PredictionsCommands {
    /// List the most recent predictions
    List {
        /// Maximum number of predictions to return
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Get a prediction by prediction id or store id
    Get {
        /// Prediction id (UUID) or 24-character store id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    // A broken config file only fails the commands that talk to the service
    let service_command = matches!(
        cli.command,
        Commands::Predict(_) | Commands::Predictions(_) | Commands::Health
    );
    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) if !service_command => {
            eprintln!("{} {:#}, using defaults", "⚠".yellow().bold(), e);
            config::Config::default()
        }
        Err(e) => return Err(e),
    };
    let format = config.resolve_format(cli.format);

    // Only service commands parse the URL; train and inspect run offline
    let api_url = config.resolve_api_url(cli.api_url.as_deref());

    // Execute command
    match cli.command {
        Commands::Train {
            data,
            out_dir,
            runs,
            n_estimators,
            max_depth,
            test_size,
            split_seed,
            base_seed,
        } => {
            let training = TrainingConfig {
                runs,
                n_estimators,
                max_depth,
                test_size,
                split_seed,
                base_seed,
            };
            train::train(training, &data, &out_dir, format).await?;
        }
        Commands::Inspect { data } => {
            inspect::inspect(&data, format)?;
        }
        Commands::Predict(args) => {
            let client = client::ApiClient::new(&api_url)?;
            predict::predict(&client, &args, format).await?;
        }
        Commands::Predictions(cmd) => {
            let client = client::ApiClient::new(&api_url)?;
            match cmd {
                PredictionsCommands::List { limit } => {
                    predictions::list_predictions(&client, limit, format).await?;
                }
                PredictionsCommands::Get { id } => {
                    predictions::get_prediction(&client, &id, format).await?;
                }
            }
        }
        Commands::Health => {
            let client = client::ApiClient::new(&api_url)?;
            health::show_health(&client, format).await?;
        }
    }

    Ok(())
}
