//! Labelled dataset loading
//!
//! Reads a headered CSV, resolves every record field and the label column
//! by name, and validates each row against the record bounds. Extra
//! columns are ignored.

use crate::models::{Field, LearningStyle, StudentRecord};
use crate::predictor::CATEGORICAL_COLUMNS;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// Name of the label column in dataset files
pub const LABEL_COLUMN: &str = "LearningStyle";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: column '{column}' has non-integer value '{value}'")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    #[error("line {line}: unknown learning style '{value}'")]
    InvalidLabel { line: u64, value: String },

    #[error("line {line}: {field} = {value} is outside [{min}, {max}]")]
    OutOfBounds {
        line: u64,
        field: Field,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("dataset contains no rows")]
    Empty,

    #[error("{records} records but {labels} labels")]
    LengthMismatch { records: usize, labels: usize },
}

/// Records and their labels, index-aligned
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<StudentRecord>,
    labels: Vec<LearningStyle>,
}

/// Shape of a dataset, for inspection before training
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub class_counts: Vec<(LearningStyle, usize)>,
    pub categories: Vec<(Field, Vec<i64>)>,
}

impl Dataset {
    pub fn from_parts(
        records: Vec<StudentRecord>,
        labels: Vec<LearningStyle>,
    ) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        if records.len() != labels.len() {
            return Err(DatasetError::LengthMismatch {
                records: records.len(),
                labels: labels.len(),
            });
        }
        Ok(Self { records, labels })
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DatasetError> {
        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };

        let columns = Field::ALL
            .iter()
            .map(|&f| position(f.name()).map(|idx| (f, idx)))
            .collect::<Result<Vec<_>, _>>()?;
        let label_idx = position(LABEL_COLUMN)?;

        let mut records = Vec::new();
        let mut labels = Vec::new();

        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);

            let mut record = StudentRecord::default();
            for &(field, idx) in &columns {
                let raw = row.get(idx).unwrap_or("");
                let value = parse_integer(raw).ok_or_else(|| DatasetError::InvalidNumber {
                    line,
                    column: field.name().to_string(),
                    value: raw.to_string(),
                })?;
                let (min, max) = field.bounds();
                if field.check(value).is_some() {
                    return Err(DatasetError::OutOfBounds {
                        line,
                        field,
                        value,
                        min,
                        max,
                    });
                }
                record.set(field, value);
            }

            let raw_label = row.get(label_idx).unwrap_or("");
            let label = LearningStyle::parse(raw_label).ok_or_else(|| DatasetError::InvalidLabel {
                line,
                value: raw_label.to_string(),
            })?;

            records.push(record);
            labels.push(label);
        }

        Self::from_parts(records, labels)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn labels(&self) -> &[LearningStyle] {
        &self.labels
    }

    pub fn label_codes(&self) -> Vec<usize> {
        self.labels.iter().map(|l| l.code()).collect()
    }

    /// Records and labels at the given indices
    pub fn select(&self, indices: &[usize]) -> (Vec<StudentRecord>, Vec<usize>) {
        indices
            .iter()
            .map(|&i| (self.records[i], self.labels[i].code()))
            .unzip()
    }

    pub fn summary(&self) -> DatasetSummary {
        let class_counts = LearningStyle::ALL
            .iter()
            .map(|&style| (style, self.labels.iter().filter(|&&l| l == style).count()))
            .collect();

        let categories = CATEGORICAL_COLUMNS
            .iter()
            .map(|&field| {
                let values: BTreeSet<i64> = self.records.iter().map(|r| r.get(field)).collect();
                (field, values.into_iter().collect())
            })
            .collect();

        DatasetSummary {
            rows: self.records.len(),
            class_counts,
            categories,
        }
    }
}

/// Integers, or floats with no fractional part
fn parse_integer(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}
