//! Feature encoding for the classifier
//!
//! Numeric columns pass through unchanged. Categorical columns are expanded
//! into one-hot blocks whose categories are learned from the training split.
//! A category never seen during fit encodes as an all-zero block.

use crate::models::{Field, StudentRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Numeric passthrough columns, in encoded order
pub const NUMERIC_COLUMNS: [Field; 12] = [
    Field::StudyHours,
    Field::Attendance,
    Field::AssignmentCompletion,
    Field::OnlineCourses,
    Field::Discussions,
    Field::Resources,
    Field::Internet,
    Field::EduTech,
    Field::StressLevel,
    Field::ExamScore,
    Field::FinalGrade,
    Field::Age,
];

/// Categorical columns, one-hot encoded after the numeric block
pub const CATEGORICAL_COLUMNS: [Field; 3] =
    [Field::Gender, Field::Motivation, Field::Extracurricular];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncoderError {
    #[error("cannot fit encoder on an empty training set")]
    EmptyInput,

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' appears more than once")]
    DuplicateColumn(Field),
}

/// Which columns the encoder keeps and how it treats them.
///
/// Fields named in neither list are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSpec {
    pub numeric: Vec<Field>,
    pub categorical: Vec<Field>,
}

impl Default for EncoderSpec {
    fn default() -> Self {
        Self {
            numeric: NUMERIC_COLUMNS.to_vec(),
            categorical: CATEGORICAL_COLUMNS.to_vec(),
        }
    }
}

impl EncoderSpec {
    /// Build a spec from column names
    pub fn from_names(numeric: &[&str], categorical: &[&str]) -> Result<Self, EncoderError> {
        let resolve = |names: &[&str]| -> Result<Vec<Field>, EncoderError> {
            names
                .iter()
                .map(|n| {
                    Field::from_name(n).ok_or_else(|| EncoderError::UnknownColumn(n.to_string()))
                })
                .collect()
        };

        Ok(Self {
            numeric: resolve(numeric)?,
            categorical: resolve(categorical)?,
        })
    }

    fn check_unique(&self) -> Result<(), EncoderError> {
        let mut seen = BTreeSet::new();
        for &field in self.numeric.iter().chain(self.categorical.iter()) {
            if !seen.insert(field) {
                return Err(EncoderError::DuplicateColumn(field));
            }
        }
        Ok(())
    }
}

/// Categories learned for one categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub column: Field,
    /// Sorted distinct values observed during fit
    pub categories: Vec<i64>,
}

/// Fitted tabular-to-numeric encoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    numeric: Vec<Field>,
    categorical: Vec<CategoricalColumn>,
}

impl FeatureEncoder {
    /// Fit the encoder on training records.
    ///
    /// Must only ever see the training split.
    pub fn fit(spec: &EncoderSpec, records: &[StudentRecord]) -> Result<Self, EncoderError> {
        if records.is_empty() {
            return Err(EncoderError::EmptyInput);
        }
        spec.check_unique()?;

        let categorical = spec
            .categorical
            .iter()
            .map(|&column| {
                let categories: BTreeSet<i64> = records.iter().map(|r| r.get(column)).collect();
                CategoricalColumn {
                    column,
                    categories: categories.into_iter().collect(),
                }
            })
            .collect();

        Ok(Self {
            numeric: spec.numeric.clone(),
            categorical,
        })
    }

    /// Encode one record into the classifier's feature row
    pub fn transform(&self, record: &StudentRecord) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.n_features());

        row.extend(self.numeric.iter().map(|&f| record.get(f) as f64));

        for column in &self.categorical {
            let value = record.get(column.column);
            row.extend(
                column
                    .categories
                    .iter()
                    .map(|&c| if c == value { 1.0 } else { 0.0 }),
            );
        }

        row
    }

    pub fn transform_batch(&self, records: &[StudentRecord]) -> Vec<Vec<f64>> {
        records.iter().map(|r| self.transform(r)).collect()
    }

    /// Width of every encoded row
    pub fn n_features(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
    }

    /// Input columns in the order the encoder consumes them
    pub fn columns(&self) -> Vec<Field> {
        self.numeric
            .iter()
            .copied()
            .chain(self.categorical.iter().map(|c| c.column))
            .collect()
    }

    /// Names of the encoded output columns
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|f| f.name().to_string()).collect();
        for column in &self.categorical {
            for category in &column.categories {
                names.push(format!("{}_{}", column.column, category));
            }
        }
        names
    }

    pub fn categorical(&self) -> &[CategoricalColumn] {
        &self.categorical
    }
}
