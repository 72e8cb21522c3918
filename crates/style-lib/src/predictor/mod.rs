//! Learning style prediction engine

mod encoder;
mod forest;
mod inference;
mod output;

pub use encoder::{
    CategoricalColumn, EncoderError, EncoderSpec, FeatureEncoder, CATEGORICAL_COLUMNS,
    NUMERIC_COLUMNS,
};
pub use forest::{DecisionTree, ForestError, ForestParams, RandomForestClassifier};
pub use inference::{InferenceContext, InferenceError, PredictionResponse, StylePrediction};
pub use output::{first_argmax, round_percentage, score_distribution, StyleScore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trait for classifiers over encoded feature rows
pub trait Classifier: Send + Sync {
    /// Width of the encoded feature row the classifier expects
    fn n_features(&self) -> usize;

    /// Number of classes in the probability output
    fn n_classes(&self) -> usize;

    /// Class probability distribution for one encoded row
    fn predict_proba_row(&self, row: &[f64]) -> Vec<f64>;

    /// Class chosen from an already computed distribution
    fn class_from_proba(&self, proba: &[f64]) -> usize {
        first_argmax(proba)
    }

    /// Predicted class for one encoded row
    fn predict_row(&self, row: &[f64]) -> usize {
        self.class_from_proba(&self.predict_proba_row(row))
    }
}

/// The selected classifier plus the provenance of its training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub forest: RandomForestClassifier,
    /// 1-based training run that produced this model
    pub run: usize,
    pub seed: u64,
    /// Held-out accuracy of this model
    pub accuracy: f64,
    pub trained_at: DateTime<Utc>,
}

impl Classifier for TrainedModel {
    fn n_features(&self) -> usize {
        self.forest.n_features()
    }

    fn n_classes(&self) -> usize {
        self.forest.n_classes()
    }

    fn predict_proba_row(&self, row: &[f64]) -> Vec<f64> {
        self.forest.predict_proba_row(row)
    }

    fn class_from_proba(&self, proba: &[f64]) -> usize {
        self.forest.class_from_proba(proba)
    }
}
