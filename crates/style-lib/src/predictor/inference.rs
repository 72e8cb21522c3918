//! Request-time inference
//!
//! [`InferenceContext`] is built once at startup from the persisted encoder
//! and classifier, then shared read-only across requests. Every call is a
//! pure function of the record and the two fitted artifacts.

use super::encoder::FeatureEncoder;
use super::output::{first_argmax, score_distribution, StyleScore};
use super::{Classifier, TrainedModel};
use crate::models::{LearningStyle, StudentRecord};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("encoder produces {encoded} features but the classifier expects {expected}")]
    FeatureMismatch { encoded: usize, expected: usize },

    #[error("classifier returned {found} probabilities, expected {expected}")]
    WrongClassCount { found: usize, expected: usize },

    #[error("classifier returned a non-finite probability")]
    NonFiniteProbability,

    #[error("classifier predicted class {predicted} but the probability argmax is {argmax}")]
    Inconsistent { predicted: usize, argmax: usize },

    #[error("classifier produced unknown class {0}")]
    UnknownClass(usize),
}

/// Result of one inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePrediction {
    pub style: LearningStyle,
    /// Raw class probabilities in fixed class order
    pub probabilities: Vec<f64>,
    pub scores: Vec<StyleScore>,
}

impl StylePrediction {
    /// Probability of the predicted style
    pub fn confidence(&self) -> f64 {
        self.probabilities.get(self.style.code()).copied().unwrap_or(0.0)
    }
}

/// Client-facing prediction body; never carries store identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_style: LearningStyle,
    pub predictions: Vec<StyleScore>,
    pub status: String,
    pub input_received: StudentRecord,
}

impl PredictionResponse {
    pub fn new(prediction: &StylePrediction, input: StudentRecord) -> Self {
        Self {
            predicted_style: prediction.style,
            predictions: prediction.scores.clone(),
            status: "success".to_string(),
            input_received: input,
        }
    }
}

/// Immutable encoder + classifier pair used to serve predictions
#[derive(Debug, Clone)]
pub struct InferenceContext<C = TrainedModel> {
    encoder: FeatureEncoder,
    model: C,
}

impl<C: Classifier> InferenceContext<C> {
    /// Pair an encoder with a classifier, rejecting mismatched widths
    pub fn new(encoder: FeatureEncoder, model: C) -> Result<Self, InferenceError> {
        if encoder.n_features() != model.n_features() {
            return Err(InferenceError::FeatureMismatch {
                encoded: encoder.n_features(),
                expected: model.n_features(),
            });
        }
        if model.n_classes() != LearningStyle::COUNT {
            return Err(InferenceError::WrongClassCount {
                found: model.n_classes(),
                expected: LearningStyle::COUNT,
            });
        }
        Ok(Self { encoder, model })
    }

    /// Encode a validated record and classify it.
    ///
    /// The classifier is evaluated once; its decision must agree with the
    /// first maximum of the distribution it returned.
    pub fn predict(&self, record: &StudentRecord) -> Result<StylePrediction, InferenceError> {
        let start = Instant::now();
        let features = self.encoder.transform(record);
        if features.len() != self.model.n_features() {
            return Err(InferenceError::FeatureMismatch {
                encoded: features.len(),
                expected: self.model.n_features(),
            });
        }

        let probabilities = self.model.predict_proba_row(&features);
        if probabilities.len() != LearningStyle::COUNT {
            return Err(InferenceError::WrongClassCount {
                found: probabilities.len(),
                expected: LearningStyle::COUNT,
            });
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(InferenceError::NonFiniteProbability);
        }

        let predicted = self.model.class_from_proba(&probabilities);
        let argmax = first_argmax(&probabilities);
        if predicted != argmax {
            return Err(InferenceError::Inconsistent { predicted, argmax });
        }
        let style =
            LearningStyle::from_code(predicted).ok_or(InferenceError::UnknownClass(predicted))?;

        debug!(
            style = %style,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Inference completed"
        );

        Ok(StylePrediction {
            style,
            scores: score_distribution(&probabilities, style),
            probabilities,
        })
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn model(&self) -> &C {
        &self.model
    }
}
