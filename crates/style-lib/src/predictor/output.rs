//! Prediction output formatting
//!
//! Turns a class probability vector into the per-style percentages shown
//! to clients.

use crate::models::LearningStyle;
use serde::{Deserialize, Serialize};

/// One learning style's share of the prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleScore {
    pub style: LearningStyle,
    /// Probability as a percentage, rounded to two decimals
    pub percentage: f64,
    pub is_predicted: bool,
}

/// Round a probability in [0, 1] to a two-decimal percentage
pub fn round_percentage(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

/// Index of the first maximum; ties resolve to the lowest index
pub fn first_argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Build the four style scores in fixed class order, flagging `predicted`
pub fn score_distribution(probabilities: &[f64], predicted: LearningStyle) -> Vec<StyleScore> {
    LearningStyle::ALL
        .iter()
        .map(|&style| StyleScore {
            style,
            percentage: round_percentage(probabilities.get(style.code()).copied().unwrap_or(0.0)),
            is_predicted: style == predicted,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_percentage() {
        assert_eq!(round_percentage(0.123456), 12.35);
        assert_eq!(round_percentage(1.0), 100.0);
        assert_eq!(round_percentage(0.0), 0.0);
        assert_eq!(round_percentage(1.0 / 3.0), 33.33);
    }

    #[test]
    fn test_first_argmax_prefers_lowest_index_on_ties() {
        assert_eq!(first_argmax(&[0.1, 0.4, 0.4, 0.1]), 1);
        assert_eq!(first_argmax(&[0.25, 0.25, 0.25, 0.25]), 0);
        assert_eq!(first_argmax(&[0.0, 0.0, 0.0, 1.0]), 3);
    }

    #[test]
    fn test_score_distribution_marks_one_style() {
        let proba = [0.12, 0.58, 0.2, 0.1];
        let scores = score_distribution(&proba, LearningStyle::Auditory);

        assert_eq!(scores.len(), 4);
        assert_eq!(scores.iter().filter(|s| s.is_predicted).count(), 1);
        assert_eq!(scores[1].style, LearningStyle::Auditory);
        assert!(scores[1].is_predicted);
        assert_eq!(scores[1].percentage, 58.0);
        assert_eq!(scores[3].style, LearningStyle::ReadingWriting);
    }

    #[test]
    fn test_rounded_percentages_sum_to_hundred() {
        let proba = [1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0];
        let scores = score_distribution(&proba, LearningStyle::Visual);
        let total: f64 = scores.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() <= 0.1, "total was {}", total);
    }
}
