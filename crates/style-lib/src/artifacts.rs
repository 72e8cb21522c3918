//! Persisted training artifacts
//!
//! The trained classifier and the fitted encoder are written as two JSON
//! files wrapped in a small envelope:
//!
//! ```json
//! { "kind": "model", "format_version": 1, "created_at": "...",
//!   "checksum": "<sha256 of payload>", "payload": { ... } }
//! ```
//!
//! The checksum covers the exact payload text, so any edit to the payload
//! is detected on load.

use crate::predictor::{FeatureEncoder, TrainedModel};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MODEL_FILE: &str = "model.json";
pub const ENCODER_FILE: &str = "preprocessor.json";
pub const REPORT_FILE: &str = "training_report.json";

/// Envelope format written by this version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Model,
    Encoder,
}

impl ArtifactKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Model => MODEL_FILE,
            ArtifactKind::Encoder => ENCODER_FILE,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Model => f.write_str("model"),
            ArtifactKind::Encoder => f.write_str("encoder"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {kind} artifact: {source}")]
    Serialize {
        kind: ArtifactKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} holds a {found} artifact, expected {expected}", .path.display())]
    KindMismatch {
        path: PathBuf,
        expected: ArtifactKind,
        found: ArtifactKind,
    },

    #[error("{} has format version {found}, supported version is {supported}", .path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("checksum mismatch in {}: recorded {expected}, computed {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    kind: ArtifactKind,
    format_version: u32,
    created_at: DateTime<Utc>,
    checksum: String,
    payload: Box<RawValue>,
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_error(path: &Path) -> impl FnOnce(serde_json::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    }
}

/// Write one artifact into `dir`, replacing any existing file atomically
pub fn save_artifact<T: Serialize>(
    dir: &Path,
    kind: ArtifactKind,
    value: &T,
) -> Result<PathBuf, ArtifactError> {
    let serialize_error = |source| ArtifactError::Serialize { kind, source };

    let payload = serde_json::to_string(value).map_err(serialize_error)?;
    let checksum = compute_checksum(payload.as_bytes());
    let envelope = Envelope {
        kind,
        format_version: FORMAT_VERSION,
        created_at: Utc::now(),
        checksum,
        payload: RawValue::from_string(payload).map_err(serialize_error)?,
    };
    let body = serde_json::to_vec_pretty(&envelope).map_err(serialize_error)?;

    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let path = dir.join(kind.file_name());
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path).map_err(io_error(&temp_path))?;
    file.write_all(&body).map_err(io_error(&temp_path))?;
    file.sync_all().map_err(io_error(&temp_path))?;
    fs::rename(&temp_path, &path).map_err(io_error(&path))?;

    debug!(
        kind = %kind,
        path = %path.display(),
        size = body.len(),
        checksum = %envelope.checksum,
        "Artifact written"
    );
    Ok(path)
}

/// Read and verify one artifact from `dir`
pub fn load_artifact<T: DeserializeOwned>(
    dir: &Path,
    kind: ArtifactKind,
) -> Result<T, ArtifactError> {
    let path = dir.join(kind.file_name());
    if !path.exists() {
        return Err(ArtifactError::Missing(path));
    }

    let body = fs::read(&path).map_err(io_error(&path))?;
    let envelope: Envelope = serde_json::from_slice(&body).map_err(parse_error(&path))?;

    if envelope.kind != kind {
        return Err(ArtifactError::KindMismatch {
            path,
            expected: kind,
            found: envelope.kind,
        });
    }
    if envelope.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            path,
            found: envelope.format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload = envelope.payload.get();
    let actual = compute_checksum(payload.as_bytes());
    if actual != envelope.checksum {
        return Err(ArtifactError::ChecksumMismatch {
            path,
            expected: envelope.checksum,
            actual,
        });
    }

    serde_json::from_str(payload).map_err(parse_error(&path))
}

/// Write the encoder and model pair
pub fn save_artifacts(
    dir: &Path,
    encoder: &FeatureEncoder,
    model: &TrainedModel,
) -> Result<(), ArtifactError> {
    let encoder_path = save_artifact(dir, ArtifactKind::Encoder, encoder)?;
    let model_path = save_artifact(dir, ArtifactKind::Model, model)?;
    info!(
        encoder = %encoder_path.display(),
        model = %model_path.display(),
        "Artifacts saved"
    );
    Ok(())
}

/// Load the encoder and model pair; both must be present and intact
pub fn load_artifacts(dir: &Path) -> Result<(FeatureEncoder, TrainedModel), ArtifactError> {
    let encoder: FeatureEncoder = load_artifact(dir, ArtifactKind::Encoder)?;
    let model: TrainedModel = load_artifact(dir, ArtifactKind::Model)?;
    info!(
        dir = %dir.display(),
        run = model.run,
        seed = model.seed,
        accuracy = model.accuracy,
        "Artifacts loaded"
    );
    Ok((encoder, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LearningStyle;
    use crate::predictor::{Classifier, EncoderSpec, ForestParams, RandomForestClassifier};
    use crate::test_support::{sample_record, synthetic_dataset};
    use tempfile::TempDir;

    fn fitted_pair() -> (FeatureEncoder, TrainedModel) {
        let (records, labels) = synthetic_dataset(80, 5);
        let encoder = FeatureEncoder::fit(&EncoderSpec::default(), &records).unwrap();
        let x = encoder.transform_batch(&records);
        let y: Vec<usize> = labels.iter().map(|l| l.code()).collect();

        let mut forest = RandomForestClassifier::new(ForestParams {
            n_estimators: 5,
            ..ForestParams::default()
        });
        forest.fit(&x, &y, LearningStyle::COUNT).unwrap();

        let model = TrainedModel {
            forest,
            run: 2,
            seed: 44,
            accuracy: 0.875,
            trained_at: Utc::now(),
        };
        (encoder, model)
    }

    #[test]
    fn test_saved_artifacts_predict_identically() {
        let dir = TempDir::new().unwrap();
        let (encoder, model) = fitted_pair();
        save_artifacts(dir.path(), &encoder, &model).unwrap();

        assert!(dir.path().join(MODEL_FILE).exists());
        assert!(dir.path().join(ENCODER_FILE).exists());

        let (loaded_encoder, loaded_model) = load_artifacts(dir.path()).unwrap();
        assert_eq!(loaded_encoder, encoder);
        assert_eq!(loaded_model.seed, 44);
        assert_eq!(loaded_model.run, 2);

        let row = encoder.transform(&sample_record());
        assert_eq!(
            loaded_model.predict_proba_row(&loaded_encoder.transform(&sample_record())),
            model.predict_proba_row(&row)
        );
    }

    #[test]
    fn test_missing_model_file() {
        let dir = TempDir::new().unwrap();
        let (encoder, _) = fitted_pair();
        save_artifact(dir.path(), ArtifactKind::Encoder, &encoder).unwrap();

        let err = load_artifacts(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(ref p) if p.ends_with(MODEL_FILE)));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (_, model) = fitted_pair();
        let path = save_artifact(dir.path(), ArtifactKind::Model, &model).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let tampered = text.replacen("\"accuracy\":0.875", "\"accuracy\":0.999", 1);
        assert_ne!(text, tampered);
        fs::write(&path, tampered).unwrap();

        let err = load_artifact::<TrainedModel>(dir.path(), ArtifactKind::Model).unwrap_err();
        assert!(matches!(err, ArtifactError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_kind_mismatch() {
        let dir = TempDir::new().unwrap();
        let (encoder, _) = fitted_pair();
        save_artifact(dir.path(), ArtifactKind::Encoder, &encoder).unwrap();
        fs::rename(dir.path().join(ENCODER_FILE), dir.path().join(MODEL_FILE)).unwrap();

        let err = load_artifact::<TrainedModel>(dir.path(), ArtifactKind::Model).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::KindMismatch {
                expected: ArtifactKind::Model,
                found: ArtifactKind::Encoder,
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let dir = TempDir::new().unwrap();
        let (encoder, _) = fitted_pair();
        let path = save_artifact(dir.path(), ArtifactKind::Encoder, &encoder).unwrap();

        let mut envelope: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        envelope["format_version"] = serde_json::json!(99);
        fs::write(&path, serde_json::to_vec(&envelope).unwrap()).unwrap();

        let err = load_artifact::<FeatureEncoder>(dir.path(), ArtifactKind::Encoder).unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedVersion { found: 99, .. }));
    }

    #[test]
    fn test_garbage_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ENCODER_FILE), b"not json").unwrap();

        let err = load_artifact::<FeatureEncoder>(dir.path(), ArtifactKind::Encoder).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }
}
