//! Offline training pipeline
//!
//! One stratified split feeds every run: the encoder is fit on the training
//! rows only, several forests are trained with different seeds, and the
//! most accurate one on the shared test rows is kept.

mod dataset;
mod selection;
mod split;


pub use dataset::{Dataset, DatasetError, DatasetSummary, LABEL_COLUMN};
pub use selection::{select_best, Candidate};
pub use split::{stratified_split, SplitError, SplitIndices};

use crate::artifacts::{self, REPORT_FILE};
use crate::models::LearningStyle;
use crate::observability::StructuredLogger;
use crate::predictor::{
    EncoderSpec, FeatureEncoder, ForestParams, RandomForestClassifier, TrainedModel,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of independently seeded forests to train
    pub runs: usize,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    /// Fraction of each class held out for evaluation
    pub test_size: f64,
    pub split_seed: u64,
    /// Run `n` trains with seed `base_seed + n`
    pub base_seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            runs: 3,
            n_estimators: 100,
            max_depth: None,
            test_size: 0.2,
            split_seed: 42,
            base_seed: 42,
        }
    }
}

impl TrainingConfig {
    fn forest_params(&self, seed: u64) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            ..ForestParams::default()
        }
        .with_random_state(seed)
    }
}

/// Outcome of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run: usize,
    pub seed: u64,
    pub accuracy: f64,
    pub duration_ms: u64,
}

/// Summary written next to the artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub config: TrainingConfig,
    pub train_rows: usize,
    pub test_rows: usize,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub runs: Vec<RunResult>,
    pub best_run: usize,
    pub best_seed: u64,
    pub best_accuracy: f64,
    pub completed_at: DateTime<Utc>,
}

/// Fitted encoder, selected model, and how they were obtained
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub encoder: FeatureEncoder,
    pub model: TrainedModel,
    pub report: TrainingReport,
}

/// Split, encode, train every run, and keep the most accurate model
pub fn train_and_select(
    config: &TrainingConfig,
    dataset: &Dataset,
    logger: &StructuredLogger,
) -> Result<TrainingOutcome> {
    anyhow::ensure!(config.runs > 0, "at least one training run is required");

    let split = stratified_split(&dataset.label_codes(), config.test_size, config.split_seed)
        .context("Failed to split dataset")?;
    let (train_records, y_train) = dataset.select(&split.train);
    let (test_records, y_test) = dataset.select(&split.test);

    let encoder = FeatureEncoder::fit(&EncoderSpec::default(), &train_records)
        .context("Failed to fit feature encoder")?;
    let x_train = encoder.transform_batch(&train_records);
    let x_test = encoder.transform_batch(&test_records);

    let mut candidates = Vec::with_capacity(config.runs);
    let mut results = Vec::with_capacity(config.runs);
    let mut best_so_far = f64::NEG_INFINITY;

    for run in 1..=config.runs {
        let seed = config.base_seed + run as u64;
        let start = Instant::now();

        let mut forest = RandomForestClassifier::new(config.forest_params(seed));
        forest
            .fit(&x_train, &y_train, LearningStyle::COUNT)
            .with_context(|| format!("Failed to train run {run}"))?;
        let accuracy = forest.score(&x_test, &y_test);

        let is_best = run == 1 || accuracy > best_so_far;
        if is_best {
            best_so_far = accuracy;
        }
        logger.log_training_run(run, seed, accuracy, is_best);

        results.push(RunResult {
            run,
            seed,
            accuracy,
            duration_ms: start.elapsed().as_millis() as u64,
        });
        candidates.push(Candidate {
            run,
            seed,
            accuracy,
            model: forest,
        });
    }

    let best = select_best(candidates).context("No training run produced a model")?;
    logger.log_training_completed(
        best.run,
        best.seed,
        best.accuracy,
        split.train.len(),
        split.test.len(),
    );

    let completed_at = Utc::now();
    let report = TrainingReport {
        config: config.clone(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        n_features: encoder.n_features(),
        feature_names: encoder.feature_names(),
        runs: results,
        best_run: best.run,
        best_seed: best.seed,
        best_accuracy: best.accuracy,
        completed_at,
    };
    let model = TrainedModel {
        forest: best.model,
        run: best.run,
        seed: best.seed,
        accuracy: best.accuracy,
        trained_at: completed_at,
    };

    Ok(TrainingOutcome {
        encoder,
        model,
        report,
    })
}

/// Load a dataset, train, and write the artifacts and report to `out_dir`
pub fn run_training(
    config: &TrainingConfig,
    data_path: &Path,
    out_dir: &Path,
    logger: &StructuredLogger,
) -> Result<TrainingReport> {
    let dataset = Dataset::from_csv_path(data_path)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;

    let outcome = train_and_select(config, &dataset, logger)?;

    artifacts::save_artifacts(out_dir, &outcome.encoder, &outcome.model)
        .context("Failed to save artifacts")?;

    let report_path = out_dir.join(REPORT_FILE);
    let body = serde_json::to_vec_pretty(&outcome.report)
        .context("Failed to serialize training report")?;
    fs::write(&report_path, body)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    Ok(outcome.report)
}
